//! Random equation synthesis.
//!
//! Candidates are drawn from a fixed catalogue of [`Template`]s, each of
//! which fixes the operator layout and the digit ranges, and are kept only
//! if they form a valid [`Equation`] whose value is a positive integer no
//! larger than [`MAX_TARGET`].

use std::ops::RangeInclusive;

use rand::Rng;

use super::{
    equation::{EQUATION_LENGTH, Equation, Operator, Symbol},
    puzzle::Puzzle,
};

/// The default number of candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// The largest target number a generated equation may have.
pub const MAX_TARGET: u32 = 9999;

const NON_ZERO: RangeInclusive<u8> = 1..=9;
const ANY_DIGIT: RangeInclusive<u8> = 0..=9;

/// A layout of digits and operators that generated equations follow.
///
/// Operators are restricted per template to those that keep results
/// positive and defined, and leading digits are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// `AB×C+D`, e.g. `12×3+4`
    ProductPlusDigit,
    /// `A+B±CD`, e.g. `1+2+34`
    DigitsPlusTens,
    /// `AB+C±D`, e.g. `12+3-4`
    TensPlusDigits,
    /// `A×B+CD`, e.g. `1×2+34`
    ProductPlusTens,
    /// `A+B×CD`, e.g. `1+2×34`
    DigitPlusProduct,
    /// `A÷B±CD`, e.g. `8÷2+34`
    QuotientPlusTens,
}

impl Template {
    /// Every template in the catalogue.
    pub const ALL: [Self; 6] = [
        Self::ProductPlusDigit,
        Self::DigitsPlusTens,
        Self::TensPlusDigits,
        Self::ProductPlusTens,
        Self::DigitPlusProduct,
        Self::QuotientPlusTens,
    ];

    /// Fills the template's digit slots at random.
    pub fn instantiate<R: Rng>(self, rng: &mut R) -> [Symbol; EQUATION_LENGTH] {
        use Operator::{Add, Divide, Multiply};

        let mut digit = |range: RangeInclusive<u8>| Symbol::Digit(rng.random_range(range));
        let op = Symbol::Operator;

        match self {
            Self::ProductPlusDigit => [
                digit(NON_ZERO),
                digit(ANY_DIGIT),
                op(Multiply),
                digit(NON_ZERO),
                op(Add),
                digit(NON_ZERO),
            ],
            Self::DigitsPlusTens => {
                let (a, b) = (digit(NON_ZERO), digit(NON_ZERO));
                let (c, d) = (digit(NON_ZERO), digit(ANY_DIGIT));
                [a, op(Add), b, op(additive(rng)), c, d]
            }
            Self::TensPlusDigits => {
                let (a, b) = (digit(NON_ZERO), digit(ANY_DIGIT));
                let (c, d) = (digit(NON_ZERO), digit(NON_ZERO));
                [a, b, op(Add), c, op(additive(rng)), d]
            }
            Self::ProductPlusTens => [
                digit(NON_ZERO),
                op(Multiply),
                digit(NON_ZERO),
                op(Add),
                digit(NON_ZERO),
                digit(ANY_DIGIT),
            ],
            Self::DigitPlusProduct => [
                digit(NON_ZERO),
                op(Add),
                digit(NON_ZERO),
                op(Multiply),
                digit(NON_ZERO),
                digit(ANY_DIGIT),
            ],
            Self::QuotientPlusTens => {
                let (a, b) = (digit(NON_ZERO), digit(NON_ZERO));
                let (c, d) = (digit(NON_ZERO), digit(ANY_DIGIT));
                [a, op(Divide), b, op(additive(rng)), c, d]
            }
        }
    }
}

fn additive<R: Rng>(rng: &mut R) -> Operator {
    if rng.random_bool(0.5) {
        Operator::Add
    } else {
        Operator::Subtract
    }
}

/// Error returned when no acceptable equation was found within the attempt
/// budget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to generate a valid equation after {attempts} attempts")]
pub struct GenerationExhausted {
    /// The number of candidates that were tried.
    pub attempts: usize,
}

/// Generates random puzzle equations by rejection sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    max_attempts: usize,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl Generator {
    /// Creates a generator that tries at most `max_attempts` candidates per
    /// call.
    #[must_use]
    pub const fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// The attempt budget for a single call.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Generates an equation using the thread-local random number generator.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationExhausted`] if no candidate was accepted within
    /// the attempt budget.
    pub fn generate(&self) -> Result<Equation, GenerationExhausted> {
        self.generate_puzzle().map(|puzzle| puzzle.equation)
    }

    /// Generates an equation together with its target number.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationExhausted`] if no candidate was accepted within
    /// the attempt budget.
    pub fn generate_puzzle(&self) -> Result<Puzzle, GenerationExhausted> {
        self.generate_with(&mut rand::rng())
    }

    /// Generates an equation and target number using the given random
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationExhausted`] if no candidate was accepted within
    /// the attempt budget.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Result<Puzzle, GenerationExhausted> {
        for _ in 0..self.max_attempts {
            let template = Template::ALL[rng.random_range(0..Template::ALL.len())];
            let candidate = template.instantiate(rng);

            let Ok(equation) = Equation::from_symbols(candidate) else {
                continue;
            };
            if let Some(target_number) = equation
                .target_number()
                .filter(|target| *target <= MAX_TARGET)
            {
                return Ok(Puzzle {
                    equation,
                    target_number,
                });
            }
        }

        Err(GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Generates an equation with the default attempt budget.
///
/// # Errors
///
/// Returns [`GenerationExhausted`] if no candidate was accepted.
pub fn generate() -> Result<Equation, GenerationExhausted> {
    Generator::default().generate()
}
