//! A filesystem backed equation store
//!
//! The [`Directory`] keeps every pool entry and daily equation as a YAML file
//! under its root:
//!
//! ```text
//! config.toml
//! pool/<uuid>.yaml
//! daily/<YYYY-MM-DD>.yaml
//! ```
//!
//! All records are loaded into memory when the directory is opened. Writes go
//! to disk first and are mirrored in memory once they succeed.

use std::{
    collections::HashSet,
    ffi::OsStr,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rayon::iter::{Either, IntoParallelRefIterator, ParallelIterator};
use uuid::Uuid;
use walkdir::WalkDir;

use super::{
    Inventory, Store, StoreError,
    record::{self, RecordError, WriteMode},
};
use crate::domain::{Config, DailyEquation, Equation, PoolEntry};

/// Name of the configuration file at the root of a store directory.
pub const CONFIG_FILE: &str = "config.toml";
const POOL_DIR: &str = "pool";
const DAILY_DIR: &str = "daily";

/// State of a [`Directory`] whose records are in memory.
#[derive(Debug)]
pub struct Loaded {
    inventory: Mutex<Inventory>,
    config: Config,
}

/// State of a [`Directory`] that has not been read yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unloaded;

/// A filesystem backed store of equations.
#[derive(Debug)]
pub struct Directory<S> {
    /// The root of the directory the records are stored in.
    root: PathBuf,
    state: S,
}

impl<S> Directory<S> {
    /// The root of the store directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pool_path(&self, id: Uuid) -> PathBuf {
        self.root.join(POOL_DIR).join(format!("{id}.yaml"))
    }

    fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(DAILY_DIR).join(format!("{date}.yaml"))
    }
}

impl Directory<Unloaded> {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unloaded,
        }
    }

    /// Load all records from disk
    ///
    /// # Errors
    ///
    /// This method has different behaviour depending on the configuration file
    /// in the store root. If `allow_unrecognised` is `true`, then any YAML
    /// files that cannot be parsed as records are skipped. If
    /// `allow_unrecognised` is `false` (the default), then any unrecognised
    /// files return an error.
    ///
    /// Records that are individually valid but break a unique constraint
    /// (two files for one equation, say) are always an error.
    pub fn load_all(self) -> Result<Directory<Loaded>, LoadError> {
        let config = load_config(&self.root);

        let pool_paths = collect_yaml_paths(&self.root.join(POOL_DIR));
        let daily_paths = collect_yaml_paths(&self.root.join(DAILY_DIR));

        let (pool, mut unrecognised) = load_records(&pool_paths, record::read_pool_entry);
        let (daily, unrecognised_daily) =
            load_records(&daily_paths, record::read_daily_equation);
        unrecognised.extend(unrecognised_daily);

        if !config.allow_unrecognised && !unrecognised.is_empty() {
            unrecognised.sort();
            return Err(LoadError::UnrecognisedFiles(unrecognised));
        }

        let mut inventory = Inventory::with_capacity(pool.len());
        inventory.insert_pool_entries(&pool)?;
        for record in daily {
            inventory.insert_daily_equation(record)?;
        }

        tracing::debug!(
            pool = inventory.pool_len(),
            daily = inventory.daily_len(),
            "loaded equation store from {}",
            self.root.display()
        );

        Ok(Directory {
            root: self.root,
            state: Loaded {
                inventory: Mutex::new(inventory),
                config,
            },
        })
    }
}

impl Directory<Loaded> {
    /// Opens and loads the directory at the given path.
    ///
    /// # Errors
    ///
    /// See [`Directory::load_all`].
    pub fn open(root: PathBuf) -> Result<Self, LoadError> {
        Directory::new(root).load_all()
    }

    /// The configuration the directory was loaded with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Store for Directory<Loaded> {
    fn find_daily_equation(&self, date: NaiveDate) -> Result<Option<DailyEquation>, StoreError> {
        Ok(self.state.inventory.lock().daily_equation(date).cloned())
    }

    fn insert_daily_equation(&self, record: DailyEquation) -> Result<(), StoreError> {
        let mut inventory = self.state.inventory.lock();
        inventory.check_daily_equation(&record)?;

        // `create_new` keeps the date unique on disk even if another process
        // wrote the file after this one loaded.
        match record::write_daily_equation(
            &self.daily_path(record.date),
            &record,
            WriteMode::CreateNew,
        ) {
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::DuplicateDate(record.date));
            }
            result => result?,
        }

        inventory.insert_daily_equation(record)
    }

    fn find_unused_pool_entry(&self) -> Result<Option<PoolEntry>, StoreError> {
        Ok(self.state.inventory.lock().first_unused().cloned())
    }

    fn mark_pool_entry_used(&self, id: Uuid) -> Result<Option<PoolEntry>, StoreError> {
        let mut inventory = self.state.inventory.lock();
        let Some(claimed) = inventory.claimable(id) else {
            return Ok(None);
        };

        record::write_pool_entry(&self.pool_path(id), &claimed, WriteMode::Overwrite)?;
        Ok(inventory.claim(id))
    }

    fn insert_pool_entries(&self, records: &[PoolEntry]) -> Result<usize, StoreError> {
        let mut inventory = self.state.inventory.lock();
        inventory.check_pool_entries(records)?;

        let written: Vec<Result<PathBuf, StoreError>> = records
            .par_iter()
            .map(|entry| {
                let path = self.pool_path(entry.id);
                record::write_pool_entry(&path, entry, WriteMode::CreateNew).map(|()| path)
            })
            .collect();
        let (created, failed): (Vec<_>, Vec<_>) = written.into_iter().partition(Result::is_ok);

        if let Some(Err(error)) = failed.into_iter().next() {
            for path in created.into_iter().flatten() {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("Failed to roll back {}: {e}", path.display());
                }
            }
            return Err(error);
        }

        let inserted = inventory.insert_pool_entries(records)?;
        tracing::debug!("wrote {inserted} pool entries to {}", self.root.display());
        Ok(inserted)
    }

    fn pool_equations(&self) -> Result<HashSet<Equation>, StoreError> {
        Ok(self.state.inventory.lock().equations())
    }

    fn count_pool_entries(&self) -> Result<usize, StoreError> {
        Ok(self.state.inventory.lock().pool_len())
    }

    fn count_used_pool_entries(&self) -> Result<usize, StoreError> {
        Ok(self.state.inventory.lock().used_len())
    }

    fn count_daily_equations(&self) -> Result<usize, StoreError> {
        Ok(self.state.inventory.lock().daily_len())
    }
}

/// Errors that can occur when loading a store directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Some record files could not be parsed.
    UnrecognisedFiles(Vec<PathBuf>),
    /// The records on disk break a unique constraint.
    Conflict(#[from] StoreError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognisedFiles(paths) => {
                write!(f, "Unrecognised files: ")?;
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                Ok(())
            }
            Self::Conflict(error) => write!(f, "Conflicting records: {error}"),
        }
    }
}

/// Loads the configuration for the store at `root`, falling back to the
/// defaults if it is missing or invalid.
#[must_use]
pub fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn collect_yaml_paths(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new("yaml")))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn load_records<T, F>(paths: &[PathBuf], read: F) -> (Vec<T>, Vec<PathBuf>)
where
    T: Send,
    F: Fn(&Path) -> Result<T, RecordError> + Sync,
{
    paths.par_iter().partition_map(|path| match read(path) {
        Ok(record) => Either::Left(record),
        Err(e) => {
            tracing::debug!("Skipping unrecognised file {}: {e}", path.display());
            Either::Right(path.clone())
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::Puzzle;

    fn setup_temp_directory() -> (TempDir, Directory<Loaded>) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().to_path_buf();
        (tmp, Directory::open(path).unwrap())
    }

    fn entry(equation: &str, used: bool) -> PoolEntry {
        let equation: Equation = equation.parse().unwrap();
        let target_number = equation.target_number().unwrap();
        PoolEntry::new(
            Puzzle {
                equation,
                target_number,
            },
            used,
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn empty_directory_loads() {
        let (_tmp, dir) = setup_temp_directory();
        assert_eq!(dir.stats().unwrap(), crate::storage::Stats::default());
        assert_eq!(dir.config(), &Config::default());
    }

    #[test]
    fn records_survive_reload() {
        let (tmp, dir) = setup_temp_directory();
        let entries = [entry("12×3+4", false), entry("1+2+34", false)];
        dir.insert_pool_entries(&entries).unwrap();

        let claimed = dir.mark_pool_entry_used(entries[0].id).unwrap().unwrap();
        let daily = DailyEquation::from_entry(date(1), &claimed);
        dir.insert_daily_equation(daily.clone()).unwrap();

        let reloaded = Directory::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.find_daily_equation(date(1)).unwrap(), Some(daily));
        assert_eq!(reloaded.count_pool_entries().unwrap(), 2);
        assert_eq!(reloaded.count_used_pool_entries().unwrap(), 1);
        assert_eq!(
            reloaded.find_unused_pool_entry().unwrap().map(|e| e.id),
            Some(entries[1].id)
        );
    }

    #[test]
    fn daily_file_is_unique_across_handles() {
        let (tmp, first) = setup_temp_directory();
        let second = Directory::open(tmp.path().to_path_buf()).unwrap();

        let a = DailyEquation::from_entry(date(2), &entry("12×3+4", true));
        let b = DailyEquation::from_entry(date(2), &entry("1+2+34", true));

        first.insert_daily_equation(a).unwrap();
        assert!(matches!(
            second.insert_daily_equation(b),
            Err(StoreError::DuplicateDate(d)) if d == date(2)
        ));
        assert_eq!(second.count_daily_equations().unwrap(), 0);
    }

    #[test]
    fn duplicate_pool_equation_writes_nothing() {
        let (tmp, dir) = setup_temp_directory();
        dir.insert_pool_entries(&[entry("12×3+4", false)]).unwrap();

        let batch = [entry("8÷2+34", false), entry("12×3+4", false)];
        assert!(matches!(
            dir.insert_pool_entries(&batch),
            Err(StoreError::DuplicateEquation(_))
        ));

        let files = fs::read_dir(tmp.path().join(POOL_DIR)).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn failed_pool_write_leaves_no_records() {
        let (tmp, dir) = setup_temp_directory();
        let batch = [
            entry("12×3+4", false),
            entry("8÷2+34", false),
            entry("1+2+34", false),
        ];
        // A directory where the second record belongs makes its write fail.
        let blocked = dir.pool_path(batch[1].id);
        fs::create_dir_all(&blocked).unwrap();

        assert!(matches!(
            dir.insert_pool_entries(&batch),
            Err(StoreError::Io { path, .. }) if path == blocked
        ));
        assert_eq!(dir.count_pool_entries().unwrap(), 0);

        let files: Vec<_> = fs::read_dir(tmp.path().join(POOL_DIR))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files, vec![blocked]);

        let reloaded = Directory::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.count_pool_entries().unwrap(), 0);
    }

    #[test]
    fn claiming_twice_fails() {
        let (_tmp, dir) = setup_temp_directory();
        let unused = entry("12+3-4", false);
        dir.insert_pool_entries(std::slice::from_ref(&unused))
            .unwrap();

        assert!(dir.mark_pool_entry_used(unused.id).unwrap().is_some());
        assert!(dir.mark_pool_entry_used(unused.id).unwrap().is_none());
    }

    #[test]
    fn unrecognised_files_are_an_error_by_default() {
        let tmp = TempDir::new().unwrap();
        let pool = tmp.path().join(POOL_DIR);
        fs::create_dir_all(&pool).unwrap();
        fs::write(pool.join("garbage.yaml"), "not: a record\n").unwrap();

        let error = Directory::open(tmp.path().to_path_buf()).unwrap_err();
        assert!(matches!(error, LoadError::UnrecognisedFiles(paths) if paths.len() == 1));
    }

    #[test]
    fn unrecognised_files_can_be_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "_version = \"1\"\nallow_unrecognised = true\n",
        )
        .unwrap();
        let daily = tmp.path().join(DAILY_DIR);
        fs::create_dir_all(&daily).unwrap();
        fs::write(daily.join("2025-06-01.yaml"), "_version: '1'\n").unwrap();
        fs::write(daily.join("notes.txt"), "ignored, wrong extension").unwrap();

        let dir = Directory::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(dir.count_daily_equations().unwrap(), 0);
        assert!(dir.config().allow_unrecognised);
    }

    #[test]
    fn conflicting_files_are_always_an_error() {
        let tmp = TempDir::new().unwrap();
        let pool = tmp.path().join(POOL_DIR);
        for e in [entry("12×3+4", false), entry("12×3+4", true)] {
            record::write_pool_entry(
                &pool.join(format!("{}.yaml", e.id)),
                &e,
                WriteMode::CreateNew,
            )
            .unwrap();
        }

        let error = Directory::open(tmp.path().to_path_buf()).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Conflict(StoreError::DuplicateEquation(_))
        ));
    }
}
