use std::path::PathBuf;

use clap::Parser;
use equatle::{Directory, Stats, Store};
use tracing::instrument;

use super::{OutputFormat, terminal::Colorize};

#[derive(Debug, Parser, Default)]
#[command(about = "Show pool and daily assignment counts")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = Directory::open(root)?;
        let stats = directory.stats()?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(&stats);
                } else {
                    Self::output_table(&stats);
                }
            }
        }

        Ok(())
    }

    fn output_quiet(stats: &Stats) {
        println!(
            "pool={} used={} unused={} daily={}",
            stats.total_pool, stats.used_pool, stats.unused_pool, stats.daily_count
        );
    }

    fn output_table(stats: &Stats) {
        if stats.total_pool == 0 && stats.daily_count == 0 {
            println!("No equations yet. Fill the pool with 'equatle pregenerate'.");
            return;
        }

        println!("Equation pool");
        println!("{}", "─────────────".dim());
        println!("{:<10} {}", "Total", stats.total_pool);
        println!("{:<10} {}", "Used", stats.used_pool);
        println!("{:<10} {}", "Unused", stats.unused_pool);
        println!();
        println!("Daily equations: {}", stats.daily_count);
        println!();

        if stats.unused_pool == 0 {
            println!("Unused equations: {} ⚠️", "0".warning());
            println!(
                "{}",
                "New dates will be generated on demand. Run 'equatle pregenerate' to refill the pool."
                    .dim()
            );
        } else {
            println!(
                "Unused equations: {} ✅",
                stats.unused_pool.to_string().success()
            );
        }
    }
}
