use std::path::Path;

use clap::Parser;
use equatle::{Generator, storage::directory::load_config};
use tracing::instrument;

use super::{OutputFormat, print_puzzle};

#[derive(Debug, Parser)]
pub struct Practice {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Practice {
    /// Generates a puzzle using the store's attempt budget. Nothing is read
    /// from or written to the pool.
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let puzzle = Generator::new(config.max_attempts()).generate_puzzle()?;
        print_puzzle(&puzzle, self.output)
    }
}
