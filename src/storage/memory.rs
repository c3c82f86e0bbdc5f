use std::collections::HashSet;

use chrono::NaiveDate;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{Inventory, Store, StoreError};
use crate::domain::{DailyEquation, Equation, PoolEntry};

/// A [`Store`] that keeps everything in process memory.
///
/// Nothing is persisted. Useful for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inventory: Mutex<Inventory>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn find_daily_equation(&self, date: NaiveDate) -> Result<Option<DailyEquation>, StoreError> {
        Ok(self.inventory.lock().daily_equation(date).cloned())
    }

    fn insert_daily_equation(&self, record: DailyEquation) -> Result<(), StoreError> {
        self.inventory.lock().insert_daily_equation(record)
    }

    fn find_unused_pool_entry(&self) -> Result<Option<PoolEntry>, StoreError> {
        Ok(self.inventory.lock().first_unused().cloned())
    }

    fn mark_pool_entry_used(&self, id: Uuid) -> Result<Option<PoolEntry>, StoreError> {
        Ok(self.inventory.lock().claim(id))
    }

    fn insert_pool_entries(&self, records: &[PoolEntry]) -> Result<usize, StoreError> {
        self.inventory.lock().insert_pool_entries(records)
    }

    fn pool_equations(&self) -> Result<HashSet<Equation>, StoreError> {
        Ok(self.inventory.lock().equations())
    }

    fn count_pool_entries(&self) -> Result<usize, StoreError> {
        Ok(self.inventory.lock().pool_len())
    }

    fn count_used_pool_entries(&self) -> Result<usize, StoreError> {
        Ok(self.inventory.lock().used_len())
    }

    fn count_daily_equations(&self) -> Result<usize, StoreError> {
        Ok(self.inventory.lock().daily_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Stats;

    #[test]
    fn empty_store_stats() {
        let store = MemoryStore::new();
        assert_eq!(store.stats().unwrap(), Stats::default());
        assert!(store.find_unused_pool_entry().unwrap().is_none());
    }

    #[test]
    fn concurrent_claims_succeed_once() {
        let store = MemoryStore::new();
        let entry = PoolEntry::new(
            crate::domain::Puzzle {
                equation: "12×3+4".parse().unwrap(),
                target_number: 40,
            },
            false,
        );
        store
            .insert_pool_entries(std::slice::from_ref(&entry))
            .unwrap();

        let claims: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.mark_pool_entry_used(entry.id).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(Option::is_some)
                .count()
        });
        assert_eq!(claims, 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.used_pool, 1);
        assert_eq!(stats.unused_pool, 0);
    }
}
