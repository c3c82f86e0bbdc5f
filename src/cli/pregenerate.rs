use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use equatle::{AllocateError, year_bounds};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::instrument;

use super::open_allocator;

#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("range").required(true).args(["start", "year"])))]
pub struct Pregenerate {
    /// First date of the range (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Last date of the range, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Generate one equation for every day of this year
    #[arg(long, conflicts_with_all = ["start", "end"])]
    year: Option<i32>,
}

impl Pregenerate {
    fn range(&self) -> anyhow::Result<(NaiveDate, NaiveDate)> {
        if let Some(year) = self.year {
            return Ok(year_bounds(year)?);
        }
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => anyhow::bail!("either --year or both --start and --end are required"),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let (start, end) = self.range()?;
        if end < start {
            return Err(AllocateError::InvalidRange { start, end }.into());
        }

        let allocator = open_allocator(root)?;
        let days = start.iter_days().take_while(|day| *day <= end).count();

        let progress = ProgressBar::new(u64::try_from(days).unwrap_or(u64::MAX));
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {pos}/{len} equations")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let report = allocator.pre_generate_range_with(start, end, || progress.inc(1));
        progress.finish_and_clear();
        let report = report?;

        println!(
            "Generated {} equations for {start} to {end}: {} added to the pool, {} duplicates skipped",
            report.generated, report.inserted, report.duplicates
        );
        Ok(())
    }
}
