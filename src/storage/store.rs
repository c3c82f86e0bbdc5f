use std::{collections::HashSet, io, path::PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{DailyEquation, Equation, PoolEntry};

/// Persistence for the equation pool and the daily assignments.
///
/// Implementations must enforce two unique constraints: at most one
/// [`DailyEquation`] per date, and at most one [`PoolEntry`] per equation.
/// [`Store::mark_pool_entry_used`] must be an atomic compare-and-set.
pub trait Store: Send + Sync {
    /// Looks up the equation assigned to `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_daily_equation(&self, date: NaiveDate) -> Result<Option<DailyEquation>, StoreError>;

    /// Records the equation assigned to a date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDate`] if the date already has an
    /// equation, or another error if the record cannot be written.
    fn insert_daily_equation(&self, record: DailyEquation) -> Result<(), StoreError>;

    /// Returns any pool entry that has not been used yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_unused_pool_entry(&self) -> Result<Option<PoolEntry>, StoreError>;

    /// Marks a pool entry as used, if it is still unused.
    ///
    /// Returns the updated entry, or `None` if the entry does not exist or
    /// was already used.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn mark_pool_entry_used(&self, id: Uuid) -> Result<Option<PoolEntry>, StoreError>;

    /// Adds entries to the pool, returning the number inserted.
    ///
    /// Either every entry is inserted or none is.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEquation`] if any equation is already
    /// in the pool or appears twice in `records`.
    fn insert_pool_entries(&self, records: &[PoolEntry]) -> Result<usize, StoreError>;

    /// Every equation currently in the pool, used or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn pool_equations(&self) -> Result<HashSet<Equation>, StoreError>;

    /// The number of entries in the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count_pool_entries(&self) -> Result<usize, StoreError>;

    /// The number of pool entries that have been used.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count_used_pool_entries(&self) -> Result<usize, StoreError>;

    /// The number of dates with an assigned equation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count_daily_equations(&self) -> Result<usize, StoreError>;

    /// Summary counts for the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn stats(&self) -> Result<Stats, StoreError> {
        let total_pool = self.count_pool_entries()?;
        let used_pool = self.count_used_pool_entries()?;
        Ok(Stats {
            total_pool,
            used_pool,
            unused_pool: total_pool.saturating_sub(used_pool),
            daily_count: self.count_daily_equations()?,
        })
    }
}

/// Summary counts for a [`Store`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Entries in the pool.
    pub total_pool: usize,
    /// Pool entries already assigned to a date.
    pub used_pool: usize,
    /// Pool entries still available.
    pub unused_pool: usize,
    /// Dates with an assigned equation.
    pub daily_count: usize,
}

/// Errors raised by a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record file could not be read or written.
    #[error("failed to access {}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to serialize record")]
    Yaml(#[from] serde_yaml::Error),

    /// The date already has an equation assigned.
    #[error("an equation is already assigned to {0}")]
    DuplicateDate(NaiveDate),

    /// The equation is already in the pool.
    #[error("equation {0} is already in the pool")]
    DuplicateEquation(Equation),

    /// A pool entry with the same identifier already exists.
    #[error("pool entry {0} already exists")]
    DuplicateId(Uuid),
}
