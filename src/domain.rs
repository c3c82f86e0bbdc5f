//! Domain models for the equation puzzle.
//!
//! This module contains the equation grammar and evaluator, the feedback and
//! solution rules used to judge guesses, the random generator, and the
//! records kept in the equation store.

mod config;
pub use config::Config;

mod difficulty;
pub use difficulty::{Difficulty, UnknownDifficulty};

/// Equation symbols, grammar and validation.
pub mod equation;
pub use equation::{Equation, InvalidEquation, MalformedInput, Operator, Symbol, validate};

pub mod evaluate;
pub use evaluate::{EvaluationError, evaluate};

pub mod feedback;
pub use feedback::{Feedback, KeyboardState, TileState, is_solved, score};

pub mod generator;
pub use generator::{GenerationExhausted, Generator, Template, generate};

mod puzzle;
pub use puzzle::{DailyEquation, PoolEntry, Puzzle};

mod solution;
pub use solution::{accepts, is_accepted_solution};

#[cfg(test)]
mod proptests;
