use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::equation::{Equation, Operator};

/// How hard an equation is to find, for display and sorting only.
///
/// Difficulty never influences validation or scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// A single addition or subtraction with a small result.
    Easy,
    /// A single multiplication, or several additive operators.
    Medium,
    /// Division, mixed multiplication, or a large result.
    Hard,
}

impl Difficulty {
    /// Classifies an equation with the given target number.
    ///
    /// The first matching rule wins:
    /// - `Hard` if the equation divides, multiplies alongside another
    ///   operator, or the target is above 50
    /// - `Medium` if it multiplies or has more than one operator
    /// - `Easy` otherwise
    #[must_use]
    pub fn classify(equation: &Equation, target_number: u32) -> Self {
        let has_division = equation.operators().any(|op| op == Operator::Divide);
        let has_multiplication = equation.operators().any(|op| op == Operator::Multiply);
        let has_multiple_operators = equation.operators().count() > 1;

        if has_division || (has_multiplication && has_multiple_operators) || target_number > 50 {
            Self::Hard
        } else if has_multiplication || has_multiple_operators {
            Self::Medium
        } else {
            Self::Easy
        }
    }

    /// The lowercase name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown difficulty name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown difficulty '{0}': expected easy, medium or hard")]
pub struct UnknownDifficulty(String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}
