use std::process;

use clap::Parser;
use equatle::Equation;
use tracing::instrument;

use super::{normalize_guess, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Validate {
    /// The guess to check, e.g. `12×3+4` (`*`, `x` and `/` are accepted)
    guess: String,
}

impl Validate {
    /// Prints whether the guess is a well-formed equation, exiting with
    /// status 1 when it is not.
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) {
        let guess = normalize_guess(&self.guess);
        match guess.parse::<Equation>() {
            Ok(equation) => {
                println!(
                    "{} {equation} = {}",
                    "valid".success(),
                    equation.value()
                );
            }
            Err(e) => {
                println!("{} {guess}: {e}", "invalid".warning());
                process::exit(1);
            }
        }
    }
}
