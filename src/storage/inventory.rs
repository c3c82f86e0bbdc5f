//! An in-memory index of pool entries and daily equations
//!
//! The [`Inventory`] knows nothing about the filesystem. It holds the
//! records and enforces the unique constraints every store shares.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::instrument;
use uuid::Uuid;

use super::StoreError;
use crate::domain::{DailyEquation, Equation, PoolEntry};

/// An in-memory representation of an equation store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    /// The pool entries, stored contiguously in insertion order.
    pool: Vec<PoolEntry>,

    /// An index from entry id to position in `pool`.
    index: HashMap<Uuid, usize>,

    /// An index from equation to entry id.
    equations: HashMap<Equation, Uuid>,

    /// Positions in `pool` of entries that have not been used.
    unused: BTreeSet<usize>,

    /// Daily equations keyed by date.
    daily: BTreeMap<NaiveDate, DailyEquation>,
}

impl Inventory {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            equations: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Checks that a batch of pool entries could be inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if an id or equation clashes with the inventory or
    /// with another entry in the batch.
    pub fn check_pool_entries(&self, entries: &[PoolEntry]) -> Result<(), StoreError> {
        let mut ids = HashSet::with_capacity(entries.len());
        let mut equations = HashSet::with_capacity(entries.len());

        for entry in entries {
            if self.index.contains_key(&entry.id) || !ids.insert(entry.id) {
                return Err(StoreError::DuplicateId(entry.id));
            }
            if self.equations.contains_key(&entry.equation) || !equations.insert(entry.equation) {
                return Err(StoreError::DuplicateEquation(entry.equation));
            }
        }

        Ok(())
    }

    /// Inserts a batch of pool entries, all or nothing.
    ///
    /// # Errors
    ///
    /// See [`Self::check_pool_entries`].
    pub fn insert_pool_entries(&mut self, entries: &[PoolEntry]) -> Result<usize, StoreError> {
        self.check_pool_entries(entries)?;
        self.pool.reserve(entries.len());
        for entry in entries {
            self.push(entry.clone());
        }
        Ok(entries.len())
    }

    fn push(&mut self, entry: PoolEntry) {
        let position = self.pool.len();
        self.index.insert(entry.id, position);
        self.equations.insert(entry.equation, entry.id);
        if !entry.used {
            self.unused.insert(position);
        }
        self.pool.push(entry);
    }

    /// Retrieves a pool entry by id.
    #[must_use]
    pub fn pool_entry(&self, id: Uuid) -> Option<&PoolEntry> {
        self.index.get(&id).and_then(|&position| self.pool.get(position))
    }

    /// The oldest pool entry that has not been used.
    #[must_use]
    pub fn first_unused(&self) -> Option<&PoolEntry> {
        self.unused
            .first()
            .and_then(|&position| self.pool.get(position))
    }

    /// Returns the entry as it would look once claimed, or `None` if it is
    /// missing or already used.
    #[must_use]
    pub fn claimable(&self, id: Uuid) -> Option<PoolEntry> {
        self.pool_entry(id)
            .filter(|entry| !entry.used)
            .map(|entry| PoolEntry {
                used: true,
                ..entry.clone()
            })
    }

    /// Marks an unused entry as used.
    ///
    /// Returns the updated entry, or `None` if it is missing or was already
    /// used.
    #[instrument(level = "trace", skip(self))]
    pub fn claim(&mut self, id: Uuid) -> Option<PoolEntry> {
        let &position = self.index.get(&id)?;
        if !self.unused.remove(&position) {
            return None;
        }
        let entry = self.pool.get_mut(position)?;
        entry.used = true;
        Some(entry.clone())
    }

    /// Retrieves the equation assigned to a date.
    #[must_use]
    pub fn daily_equation(&self, date: NaiveDate) -> Option<&DailyEquation> {
        self.daily.get(&date)
    }

    /// Checks that a daily equation could be inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDate`] if the date is taken.
    pub fn check_daily_equation(&self, record: &DailyEquation) -> Result<(), StoreError> {
        if self.daily.contains_key(&record.date) {
            return Err(StoreError::DuplicateDate(record.date));
        }
        Ok(())
    }

    /// Inserts a daily equation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDate`] if the date is taken.
    pub fn insert_daily_equation(&mut self, record: DailyEquation) -> Result<(), StoreError> {
        self.check_daily_equation(&record)?;
        self.daily.insert(record.date, record);
        Ok(())
    }

    /// Every equation in the pool.
    #[must_use]
    pub fn equations(&self) -> HashSet<Equation> {
        self.equations.keys().copied().collect()
    }

    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn used_len(&self) -> usize {
        self.pool.len() - self.unused.len()
    }

    #[must_use]
    pub fn daily_len(&self) -> usize {
        self.daily.len()
    }
}
