use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::instrument;

use super::{OutputFormat, open_allocator, print_puzzle};

#[derive(Debug, Parser)]
pub struct Daily {
    /// The date to resolve (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Daily {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let allocator = open_allocator(root)?;
        let daily = allocator.resolve_for_date(date)?;

        if matches!(self.output, OutputFormat::Table) {
            println!("Date:          {date}");
        }
        print_puzzle(&daily.puzzle(), self.output)
    }
}
