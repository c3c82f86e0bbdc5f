use std::{path::PathBuf, process};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use equatle::{Equation, KeyboardState, domain::feedback::score_symbols, is_accepted_solution};
use tracing::instrument;

use super::{
    normalize_guess, open_allocator,
    terminal::{Colorize, tile},
};

#[derive(Debug, Parser)]
pub struct Check {
    /// One or more guesses, scored in order (`*`, `x` and `/` are accepted)
    #[arg(required = true)]
    guesses: Vec<String>,

    /// Score against this equation instead of a daily one
    #[arg(long, conflicts_with = "date")]
    target: Option<String>,

    /// Score against the equation for this date (YYYY-MM-DD). Defaults to
    /// today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl Check {
    /// Scores each guess and prints its tiles, followed by the best known
    /// state of every symbol guessed. Exits with status 1 if any guess is not
    /// a valid equation.
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let target = match &self.target {
            Some(target) => normalize_guess(target)
                .parse::<Equation>()
                .map_err(|e| anyhow::anyhow!("Invalid target equation: {e}"))?,
            None => {
                let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
                open_allocator(root)?.resolve_for_date(date)?.equation
            }
        };
        let target_text = target.to_string();

        let mut keyboard = KeyboardState::new();
        let mut all_valid = true;

        for raw in &self.guesses {
            let guess = normalize_guess(raw);
            let equation = match guess.parse::<Equation>() {
                Ok(equation) => equation,
                Err(e) => {
                    println!("{} {guess}: {e}", "invalid".warning());
                    all_valid = false;
                    continue;
                }
            };

            let feedback = score_symbols(equation.symbols(), target.symbols());
            keyboard.record(equation.symbols(), &feedback);

            let row: String = guess
                .chars()
                .zip(feedback)
                .map(|(symbol, state)| tile(symbol, state))
                .collect();
            let verdict = if is_accepted_solution(&guess, &target_text) {
                "solved".success()
            } else {
                format!("= {}", equation.value()).dim()
            };
            println!("{row}  {verdict}");
        }

        let keys: String = keyboard
            .iter()
            .map(|(symbol, state)| tile(symbol, state))
            .collect();
        if !keys.is_empty() {
            println!();
            println!("{keys}");
        }

        if !all_valid {
            process::exit(1);
        }
        Ok(())
    }
}
