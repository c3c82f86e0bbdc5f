//! A daily arithmetic puzzle engine
//!
//! Players guess a hidden six character equation such as `12×3+4`. This
//! crate validates and evaluates guesses, scores them tile by tile, decides
//! whether a guess is an accepted solution, generates new equations, and
//! assigns exactly one equation to each calendar date from a deduplicated
//! pool.

pub mod domain;
pub use domain::{
    Config, DailyEquation, Difficulty, Equation, Feedback, GenerationExhausted, Generator,
    KeyboardState, MalformedInput, PoolEntry, Puzzle, TileState, evaluate, generate,
    is_accepted_solution, score, validate,
};

/// Persistence for the equation pool and daily assignments.
pub mod storage;
pub use storage::{Directory, MemoryStore, Stats, Store, StoreError};

mod allocator;
pub use allocator::{AllocateError, Allocator, PreGenerateReport, year_bounds};
