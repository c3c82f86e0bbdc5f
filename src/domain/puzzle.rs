// Records handed out to players and kept in the equation store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Difficulty, Equation};

/// An equation to solve, together with the number it evaluates to.
///
/// Serializes as `{"equation": "12×3+4", "targetNumber": 40}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    /// The hidden equation.
    pub equation: Equation,
    /// The value the equation evaluates to.
    pub target_number: u32,
}

impl Puzzle {
    /// The display difficulty of this puzzle.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::classify(&self.equation, self.target_number)
    }
}

/// A generated equation held in the pool until it is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    /// Stable identifier of the entry.
    pub id: Uuid,
    /// The equation. Unique across the whole pool.
    pub equation: Equation,
    /// The value the equation evaluates to.
    pub target_number: u32,
    /// Display difficulty, derived from the equation and target.
    pub difficulty: Difficulty,
    /// Whether the entry has been assigned to a date.
    ///
    /// Flips from `false` to `true` at most once.
    pub used: bool,
    /// When the entry was generated.
    pub created: DateTime<Utc>,
}

impl PoolEntry {
    /// Creates a new pool entry for a generated puzzle.
    #[must_use]
    pub fn new(puzzle: Puzzle, used: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            equation: puzzle.equation,
            target_number: puzzle.target_number,
            difficulty: puzzle.difficulty(),
            used,
            created: Utc::now(),
        }
    }

    /// The puzzle this entry holds.
    #[must_use]
    pub const fn puzzle(&self) -> Puzzle {
        Puzzle {
            equation: self.equation,
            target_number: self.target_number,
        }
    }
}

/// The equation assigned to a calendar date.
///
/// Created at most once per date and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyEquation {
    /// Stable identifier of the record.
    pub id: Uuid,
    /// The date the equation is assigned to.
    pub date: NaiveDate,
    /// The equation for the date.
    pub equation: Equation,
    /// The value the equation evaluates to.
    pub target_number: u32,
    /// Display difficulty.
    pub difficulty: Difficulty,
    /// When the assignment was made.
    pub created: DateTime<Utc>,
}

impl DailyEquation {
    /// Assigns a pool entry to a date.
    #[must_use]
    pub fn from_entry(date: NaiveDate, entry: &PoolEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            equation: entry.equation,
            target_number: entry.target_number,
            difficulty: entry.difficulty,
            created: Utc::now(),
        }
    }

    /// The puzzle for this date.
    #[must_use]
    pub const fn puzzle(&self) -> Puzzle {
        Puzzle {
            equation: self.equation,
            target_number: self.target_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puzzle_serializes_camel_case() {
        let puzzle = Puzzle {
            equation: "12×3+4".parse().unwrap(),
            target_number: 40,
        };
        let json = serde_json::to_value(puzzle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "equation": "12×3+4", "targetNumber": 40 })
        );
    }

    #[test]
    fn daily_equation_copies_entry() {
        let puzzle = Puzzle {
            equation: "8÷2+34".parse().unwrap(),
            target_number: 38,
        };
        let entry = PoolEntry::new(puzzle, true);
        assert_eq!(entry.difficulty, Difficulty::Hard);

        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let daily = DailyEquation::from_entry(date, &entry);
        assert_eq!(daily.puzzle(), entry.puzzle());
        assert_eq!(daily.difficulty, entry.difficulty);
        assert_eq!(daily.date, date);
    }
}
