//! Versioned YAML records for the directory store.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::StoreError;
use crate::domain::{DailyEquation, Difficulty, Equation, PoolEntry};

/// How a record file is opened for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail if the file already exists.
    CreateNew,
    /// Replace any existing file.
    Overwrite,
}

/// Errors that can occur when reading a record file.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The file could not be read.
    #[error("failed to read record")]
    Io(#[from] io::Error),
    /// The YAML could not be parsed.
    #[error("failed to parse record")]
    Yaml(#[from] serde_yaml::Error),
    /// The stored target number disagrees with the equation.
    #[error("{equation} does not evaluate to {recorded}")]
    TargetMismatch {
        /// The stored equation.
        equation: Equation,
        /// The stored target number.
        recorded: u32,
    },
    /// The file name does not match the record it holds.
    #[error("expected the file to be named {expected}")]
    Misplaced {
        /// The file stem the record should have.
        expected: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum PoolRecord {
    #[serde(rename = "1")]
    V1 {
        id: Uuid,
        equation: Equation,
        target_number: u32,
        difficulty: Difficulty,
        used: bool,
        created: DateTime<Utc>,
    },
}

impl From<&PoolEntry> for PoolRecord {
    fn from(entry: &PoolEntry) -> Self {
        Self::V1 {
            id: entry.id,
            equation: entry.equation,
            target_number: entry.target_number,
            difficulty: entry.difficulty,
            used: entry.used,
            created: entry.created,
        }
    }
}

impl TryFrom<PoolRecord> for PoolEntry {
    type Error = RecordError;

    fn try_from(record: PoolRecord) -> Result<Self, Self::Error> {
        match record {
            PoolRecord::V1 {
                id,
                equation,
                target_number,
                difficulty,
                used,
                created,
            } => {
                check_target(equation, target_number)?;
                Ok(Self {
                    id,
                    equation,
                    target_number,
                    difficulty,
                    used,
                    created,
                })
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum DailyRecord {
    #[serde(rename = "1")]
    V1 {
        id: Uuid,
        date: NaiveDate,
        equation: Equation,
        target_number: u32,
        difficulty: Difficulty,
        created: DateTime<Utc>,
    },
}

impl From<&DailyEquation> for DailyRecord {
    fn from(daily: &DailyEquation) -> Self {
        Self::V1 {
            id: daily.id,
            date: daily.date,
            equation: daily.equation,
            target_number: daily.target_number,
            difficulty: daily.difficulty,
            created: daily.created,
        }
    }
}

impl TryFrom<DailyRecord> for DailyEquation {
    type Error = RecordError;

    fn try_from(record: DailyRecord) -> Result<Self, Self::Error> {
        match record {
            DailyRecord::V1 {
                id,
                date,
                equation,
                target_number,
                difficulty,
                created,
            } => {
                check_target(equation, target_number)?;
                Ok(Self {
                    id,
                    date,
                    equation,
                    target_number,
                    difficulty,
                    created,
                })
            }
        }
    }
}

fn check_target(equation: Equation, recorded: u32) -> Result<(), RecordError> {
    if equation.target_number() == Some(recorded) {
        Ok(())
    } else {
        Err(RecordError::TargetMismatch { equation, recorded })
    }
}

fn check_name(path: &Path, expected: String) -> Result<(), RecordError> {
    if path.file_stem().and_then(|stem| stem.to_str()) == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(RecordError::Misplaced { expected })
    }
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

fn write<T: Serialize>(path: &Path, record: &T, mode: WriteMode) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    match mode {
        WriteMode::CreateNew => options.create_new(true),
        WriteMode::Overwrite => options.create(true).truncate(true),
    };

    let content = serde_yaml::to_string(record)?;
    let file = options.open(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let written = writer
        .write_all(content.as_bytes())
        .and_then(|()| writer.flush());

    // A new file that could not be written in full is not left behind.
    if written.is_err() && mode == WriteMode::CreateNew {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to remove partial record {}: {e}", path.display());
        }
    }
    written.map_err(io_error)
}

/// Reads a pool entry from `<id>.yaml`.
pub fn read_pool_entry(path: &Path) -> Result<PoolEntry, RecordError> {
    let entry = PoolEntry::try_from(read::<PoolRecord>(path)?)?;
    check_name(path, entry.id.to_string())?;
    Ok(entry)
}

/// Writes a pool entry.
pub fn write_pool_entry(path: &Path, entry: &PoolEntry, mode: WriteMode) -> Result<(), StoreError> {
    write(path, &PoolRecord::from(entry), mode)
}

/// Reads a daily equation from `<YYYY-MM-DD>.yaml`.
pub fn read_daily_equation(path: &Path) -> Result<DailyEquation, RecordError> {
    let daily = DailyEquation::try_from(read::<DailyRecord>(path)?)?;
    check_name(path, daily.date.to_string())?;
    Ok(daily)
}

/// Writes a daily equation.
pub fn write_daily_equation(
    path: &Path,
    daily: &DailyEquation,
    mode: WriteMode,
) -> Result<(), StoreError> {
    write(path, &DailyRecord::from(daily), mode)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn sample_entry() -> PoolEntry {
        PoolEntry {
            id: Uuid::parse_str("12b3f5c5-b1a8-4aa8-a882-20ff1c2aab53").unwrap(),
            equation: "12×3+4".parse().unwrap(),
            target_number: 40,
            difficulty: Difficulty::Medium,
            used: false,
            created: Utc.with_ymd_and_hms(2025, 7, 14, 7, 15, 0).unwrap(),
        }
    }

    #[test]
    fn pool_entry_is_written_as_versioned_yaml() {
        let tmp = TempDir::new().unwrap();
        let entry = sample_entry();
        let path = tmp.path().join(format!("{}.yaml", entry.id));

        write_pool_entry(&path, &entry, WriteMode::CreateNew).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("_version: '1'\n"));
        assert!(content.contains("target_number: 40\n"));
        assert!(content.contains("difficulty: medium\n"));
        assert!(content.contains("used: false\n"));
        assert_eq!(read_pool_entry(&path).unwrap(), entry);
    }

    #[test]
    fn create_new_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let entry = sample_entry();
        let path = tmp.path().join(format!("{}.yaml", entry.id));

        write_pool_entry(&path, &entry, WriteMode::CreateNew).unwrap();
        let error = write_pool_entry(&path, &entry, WriteMode::CreateNew).unwrap_err();
        assert!(matches!(
            error,
            StoreError::Io { source, .. } if source.kind() == io::ErrorKind::AlreadyExists
        ));

        let used = PoolEntry {
            used: true,
            ..entry
        };
        write_pool_entry(&path, &used, WriteMode::Overwrite).unwrap();
        assert!(read_pool_entry(&path).unwrap().used);
    }

    #[test]
    fn mismatched_target_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let entry = PoolEntry {
            target_number: 41,
            ..sample_entry()
        };
        let path = tmp.path().join(format!("{}.yaml", entry.id));
        write_pool_entry(&path, &entry, WriteMode::CreateNew).unwrap();

        assert!(matches!(
            read_pool_entry(&path),
            Err(RecordError::TargetMismatch { recorded: 41, .. })
        ));
    }

    #[test]
    fn daily_equation_must_match_its_file_name() {
        let tmp = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let daily = DailyEquation::from_entry(date, &sample_entry());

        let right = tmp.path().join("2025-07-14.yaml");
        write_daily_equation(&right, &daily, WriteMode::CreateNew).unwrap();
        assert_eq!(read_daily_equation(&right).unwrap(), daily);

        let wrong = tmp.path().join("2025-07-15.yaml");
        write_daily_equation(&wrong, &daily, WriteMode::CreateNew).unwrap();
        assert!(matches!(
            read_daily_equation(&wrong),
            Err(RecordError::Misplaced { expected }) if expected == "2025-07-14"
        ));
    }

    #[test]
    fn unknown_version_fails_to_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2025-07-14.yaml");
        fs::write(&path, "_version: '2'\ndate: 2025-07-14\n").unwrap();

        assert!(matches!(
            read_daily_equation(&path),
            Err(RecordError::Yaml(_))
        ));
    }
}
