//! Assignment of equations to calendar dates.
//!
//! The [`Allocator`] resolves a date to exactly one equation. Dates that
//! already have an equation get it back unchanged. Otherwise an unused
//! equation is claimed from the pool, or a fresh one is generated when the
//! pool is exhausted.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    domain::{DailyEquation, GenerationExhausted, Generator, PoolEntry, Puzzle},
    storage::{Stats, Store, StoreError},
};

/// Maps dates to equations drawn from a deduplicated pool.
#[derive(Debug)]
pub struct Allocator<S> {
    store: S,
    generator: Generator,

    /// One lock per date currently being resolved.
    locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl<S: Store> Allocator<S> {
    /// Creates an allocator over the given store.
    #[must_use]
    pub fn new(store: S, generator: Generator) -> Self {
        Self {
            store,
            generator,
            locks: Mutex::default(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The generator used for practice puzzles and pool top-ups.
    #[must_use]
    pub const fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Returns the equation for `date`, assigning one if necessary.
    ///
    /// Concurrent calls for the same date are serialized and all observe the
    /// same equation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or if the pool is exhausted and
    /// no new equation could be generated.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve_for_date(&self, date: NaiveDate) -> Result<DailyEquation, AllocateError> {
        let lock = self.date_lock(date);
        let result = {
            let _guard = lock.lock();
            self.resolve_locked(date)
        };
        self.release_date_lock(date, lock);
        result
    }

    fn date_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.lock().entry(date).or_default())
    }

    fn release_date_lock(&self, date: NaiveDate, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        // One reference in the map, one held here: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&date);
        }
    }

    fn resolve_locked(&self, date: NaiveDate) -> Result<DailyEquation, AllocateError> {
        if let Some(existing) = self.store.find_daily_equation(date)? {
            debug!(%date, "equation already assigned");
            return Ok(existing);
        }

        let entry = match self.claim_pool_entry()? {
            Some(entry) => entry,
            None => {
                debug!(%date, "equation pool exhausted, generating a new equation");
                self.generate_used_entry()?
            }
        };

        let daily = DailyEquation::from_entry(date, &entry);
        self.store.insert_daily_equation(daily.clone())?;
        info!(%date, equation = %daily.equation, "assigned daily equation");
        Ok(daily)
    }

    fn claim_pool_entry(&self) -> Result<Option<PoolEntry>, StoreError> {
        while let Some(candidate) = self.store.find_unused_pool_entry()? {
            if let Some(entry) = self.store.mark_pool_entry_used(candidate.id)? {
                return Ok(Some(entry));
            }
            debug!(id = %candidate.id, "pool entry claimed concurrently, retrying");
        }
        Ok(None)
    }

    /// Generates an equation that is not yet in the pool and records it as
    /// an already used entry.
    fn generate_used_entry(&self) -> Result<PoolEntry, AllocateError> {
        let existing = self.store.pool_equations()?;
        let attempts = self.generator.max_attempts();

        for _ in 0..attempts {
            let puzzle = self.generator.generate_puzzle()?;
            if existing.contains(&puzzle.equation) {
                continue;
            }

            let entry = PoolEntry::new(puzzle, true);
            match self.store.insert_pool_entries(std::slice::from_ref(&entry)) {
                Ok(_) => return Ok(entry),
                Err(StoreError::DuplicateEquation(equation)) => {
                    debug!(%equation, "equation added to the pool concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(GenerationExhausted { attempts }.into())
    }

    /// Generates a puzzle without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationExhausted`] if the generator gives up.
    pub fn resolve_for_practice(&self) -> Result<Puzzle, GenerationExhausted> {
        self.generator.generate_puzzle()
    }

    /// Tops up the pool with one new equation per date in `start..=end`.
    ///
    /// No dates are assigned. Equations already in the pool, or generated
    /// twice in the batch, are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is empty, if generation fails, or if the
    /// store rejects the batch.
    pub fn pre_generate_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PreGenerateReport, AllocateError> {
        self.pre_generate_range_with(start, end, || {})
    }

    /// [`Self::pre_generate_range`], calling `on_generated` after each
    /// equation is generated.
    ///
    /// # Errors
    ///
    /// See [`Self::pre_generate_range`].
    #[instrument(level = "debug", skip(self, on_generated))]
    pub fn pre_generate_range_with<F>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        on_generated: F,
    ) -> Result<PreGenerateReport, AllocateError>
    where
        F: Fn() + Sync + Send,
    {
        if end < start {
            return Err(AllocateError::InvalidRange { start, end });
        }

        let days = start.iter_days().take_while(|day| *day <= end).count();
        let generator = self.generator;
        let puzzles = (0..days)
            .into_par_iter()
            .map(|_| {
                let puzzle = generator.generate_puzzle();
                on_generated();
                puzzle
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = self.store.pool_equations()?;
        let mut duplicates = 0;
        let mut entries: Vec<PoolEntry> = puzzles
            .into_iter()
            .filter_map(|puzzle| {
                if seen.insert(puzzle.equation) {
                    Some(PoolEntry::new(puzzle, false))
                } else {
                    duplicates += 1;
                    None
                }
            })
            .collect();

        let inserted = loop {
            match self.store.insert_pool_entries(&entries) {
                Ok(inserted) => break inserted,
                Err(StoreError::DuplicateEquation(equation)) => {
                    debug!(%equation, "equation added to the pool concurrently, skipping");
                    entries.retain(|entry| entry.equation != equation);
                    duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(
            generated = days,
            inserted, duplicates, "pre-generated equations from {start} to {end}"
        );

        Ok(PreGenerateReport {
            generated: days,
            inserted,
            duplicates,
        })
    }

    /// [`Self::pre_generate_range`] over the whole of `year`.
    ///
    /// # Errors
    ///
    /// See [`Self::pre_generate_range`]. Also fails if `year` is outside the
    /// supported calendar.
    pub fn pre_generate_year(&self, year: i32) -> Result<PreGenerateReport, AllocateError> {
        let (start, end) = year_bounds(year)?;
        self.pre_generate_range(start, end)
    }

    /// Summary counts for the underlying store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn stats(&self) -> Result<Stats, StoreError> {
        self.store.stats()
    }
}

/// The first and last day of `year`.
///
/// # Errors
///
/// Returns [`AllocateError::InvalidYear`] if the year cannot be represented.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AllocateError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start.zip(end).ok_or(AllocateError::InvalidYear(year))
}

/// The outcome of a pre-generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreGenerateReport {
    /// Equations generated, one per date in the range.
    pub generated: usize,
    /// New entries added to the pool.
    pub inserted: usize,
    /// Generated equations skipped because they were already present.
    pub duplicates: usize,
}

/// Errors raised by an [`Allocator`].
#[derive(Debug, thiserror::Error)]
pub enum AllocateError {
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No new equation could be generated.
    #[error(transparent)]
    Generation(#[from] GenerationExhausted),

    /// The end of a date range is before its start.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// First date of the range.
        start: NaiveDate,
        /// Last date of the range.
        end: NaiveDate,
    },

    /// The year cannot be represented as a calendar date.
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::{Directory, MemoryStore};

    fn allocator() -> Allocator<MemoryStore> {
        Allocator::new(MemoryStore::new(), Generator::default())
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn resolving_a_date_is_idempotent() {
        let allocator = allocator();
        let first = allocator.resolve_for_date(date(3, 1)).unwrap();
        let second = allocator.resolve_for_date(date(3, 1)).unwrap();

        assert_eq!(first, second);
        let stats = allocator.stats().unwrap();
        assert_eq!(stats.daily_count, 1);
        assert_eq!(stats.total_pool, 1);
        assert_eq!(stats.used_pool, 1);
    }

    #[test]
    fn resolved_equations_are_valid_puzzles() {
        let allocator = allocator();
        let daily = allocator.resolve_for_date(date(3, 2)).unwrap();

        assert_eq!(daily.equation.target_number(), Some(daily.target_number));
        assert!((1..=9999).contains(&daily.target_number));
        assert_eq!(daily.difficulty, daily.puzzle().difficulty());
    }

    #[test]
    fn dates_claim_pool_entries_before_generating() {
        let allocator = allocator();
        let report = allocator
            .pre_generate_range(date(4, 1), date(4, 3))
            .unwrap();
        let pool = allocator.store().pool_equations().unwrap();
        assert_eq!(pool.len(), report.inserted);

        let claimable = u32::try_from(report.inserted).unwrap();
        for day in 1..=claimable {
            let daily = allocator.resolve_for_date(date(4, day)).unwrap();
            assert!(pool.contains(&daily.equation));
        }

        let stats = allocator.stats().unwrap();
        assert_eq!(stats.daily_count, report.inserted);
        assert_eq!(stats.total_pool, report.inserted);
        assert_eq!(stats.unused_pool, 0);
    }

    #[test]
    fn distinct_dates_get_distinct_equations() {
        let allocator = allocator();
        let equations: HashSet<_> = (1..=30)
            .map(|day| allocator.resolve_for_date(date(5, day)).unwrap().equation)
            .collect();
        assert_eq!(equations.len(), 30);
    }

    #[test]
    fn concurrent_resolution_agrees_on_one_equation() {
        let allocator = allocator();
        allocator
            .pre_generate_range(date(6, 1), date(6, 10))
            .unwrap();

        let results: Vec<DailyEquation> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| allocator.resolve_for_date(date(6, 15)).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(allocator.stats().unwrap().daily_count, 1);
        assert_eq!(allocator.stats().unwrap().used_pool, 1);
        assert!(allocator.locks.lock().is_empty());
    }

    #[test]
    fn concurrent_dates_never_share_a_pool_entry() {
        let allocator = allocator();
        allocator
            .pre_generate_range(date(7, 1), date(7, 20))
            .unwrap();

        let equations: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=20)
                .map(|day| {
                    let allocator = &allocator;
                    scope.spawn(move || allocator.resolve_for_date(date(8, day)).unwrap())
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap().equation)
                .collect()
        });

        let unique: HashSet<_> = equations.iter().collect();
        assert_eq!(unique.len(), equations.len());
    }

    #[test]
    fn practice_touches_nothing() {
        let allocator = allocator();
        let puzzle = allocator.resolve_for_practice().unwrap();

        assert_eq!(puzzle.equation.target_number(), Some(puzzle.target_number));
        assert_eq!(allocator.stats().unwrap(), Stats::default());
    }

    #[test]
    fn pre_generation_skips_existing_equations() {
        let allocator = allocator();
        let report = allocator
            .pre_generate_range(date(1, 1), date(1, 31))
            .unwrap();

        assert_eq!(report.generated, 31);
        assert_eq!(report.inserted + report.duplicates, 31);

        let stats = allocator.stats().unwrap();
        assert_eq!(stats.total_pool, report.inserted);
        assert_eq!(stats.used_pool, 0);
        assert_eq!(stats.daily_count, 0);
    }

    #[test]
    fn pre_generation_reports_progress() {
        let allocator = allocator();
        let calls = std::sync::atomic::AtomicUsize::new(0);
        allocator
            .pre_generate_range_with(date(2, 1), date(2, 28), || {
                calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(calls.into_inner(), 28);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let allocator = allocator();
        assert!(matches!(
            allocator.pre_generate_range(date(2, 2), date(2, 1)),
            Err(AllocateError::InvalidRange { .. })
        ));
    }

    #[test]
    fn single_day_range_generates_once() {
        let allocator = allocator();
        let report = allocator
            .pre_generate_range(date(9, 9), date(9, 9))
            .unwrap();
        assert_eq!(
            report,
            PreGenerateReport {
                generated: 1,
                inserted: 1,
                duplicates: 0
            }
        );
    }

    #[test]
    fn year_covers_every_day() {
        assert_eq!(
            year_bounds(2024).unwrap(),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
            )
        );
        assert!(matches!(
            year_bounds(i32::MAX),
            Err(AllocateError::InvalidYear(_))
        ));

        let allocator = allocator();
        let report = allocator.pre_generate_year(2024).unwrap();
        assert_eq!(report.generated, 366);
    }

    #[test]
    fn directory_dates_survive_reopening() {
        let tmp = TempDir::new().unwrap();
        let open = || {
            Allocator::new(
                Directory::open(tmp.path().to_path_buf()).unwrap(),
                Generator::default(),
            )
        };

        let allocator = open();
        allocator.pre_generate_range(date(11, 1), date(11, 2)).unwrap();
        let days: Vec<_> = (1..=4)
            .map(|day| allocator.resolve_for_date(date(11, day)).unwrap())
            .collect();
        let stats = allocator.stats().unwrap();
        drop(allocator);

        let reopened = open();
        for (day, daily) in (1..=4).zip(&days) {
            assert_eq!(&reopened.resolve_for_date(date(11, day)).unwrap(), daily);
        }
        assert_eq!(reopened.stats().unwrap(), stats);

        let equations: HashSet<_> = days.iter().map(|daily| daily.equation).collect();
        assert_eq!(equations.len(), days.len());
    }

    #[test]
    fn exhausted_generator_surfaces_an_error() {
        let allocator = Allocator::new(MemoryStore::new(), Generator::new(0));
        assert!(matches!(
            allocator.resolve_for_date(date(10, 1)),
            Err(AllocateError::Generation(_))
        ));
        assert_eq!(allocator.stats().unwrap().daily_count, 0);
    }
}
