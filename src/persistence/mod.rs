//! Durable key/integer records
//!
//! Features:
//! - `PersistentStore` trait: last-write-wins, no transactions
//! - In-memory store for tests and headless runs
//! - JSON file store with atomic save (tmp then rename)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Record keys used by the game
pub mod keys {
    pub const HIGH_SCORE: &str = "HighScore";
    pub const RECORD_LEAP_STREAK: &str = "RecordLeapStreak";
    pub const RECORD_LEAP_SCORE: &str = "RecordLeapScore";
    pub const RECORD_NEAR_MISS_STREAK: &str = "RecordNearMissStreak";
    pub const RECORD_DIFFICULTY_REACHED: &str = "RecordDifficultyReached";
    pub const TOTAL_BUGS_EATEN: &str = "TotalBugsEaten";
    pub const FIREFLIES_EATEN: &str = "FirefliesEaten";
    pub const LEAPFROG_COUNT: &str = "Achv_LeapfrogCount";
}

/// Simple key to integer store
pub trait PersistentStore {
    fn get_int(&self, key: &str, default: i64) -> i64;
    fn set_int(&mut self, key: &str, value: i64);

    /// Store `value` if it beats the current record; returns true if it did
    fn set_max(&mut self, key: &str, value: i64) -> bool {
        if value > self.get_int(key, 0) {
            self.set_int(key, value);
            true
        } else {
            false
        }
    }

    /// Add to a running total
    fn add_int(&mut self, key: &str, amount: i64) {
        if amount != 0 {
            let total = self.get_int(key, 0).saturating_add(amount);
            self.set_int(key, total);
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Volatile store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }
}

/// Store backed by a JSON object on disk
///
/// Writes stay in memory until `flush`. A missing file loads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: MemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut values = MemoryStore::new();

        match fs::read_to_string(&path) {
            Ok(json) => {
                values.values = serde_json::from_str(&json)?;
                log::info!("Loaded {} records from {}", values.len(), path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No record file at {}, starting fresh", path.display());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        }

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Write to disk if anything changed
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let io = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&self.values.values)?;
        fs::write(&tmp, data).map_err(io)?;
        fs::rename(&tmp, &self.path).map_err(io)?;
        self.dirty = false;
        log::debug!("Saved {} records", self.values.len());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for JsonFileStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get_int(key, default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.set_int(key, value);
        self.dirty = true;
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to save records: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("frog-go-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_memory_store_defaults() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_int(keys::HIGH_SCORE, 7), 7);
        store.set_int(keys::HIGH_SCORE, 12);
        assert_eq!(store.get_int(keys::HIGH_SCORE, 7), 12);
    }

    #[test]
    fn test_set_max_only_raises() {
        let mut store = MemoryStore::new();
        assert!(store.set_max(keys::RECORD_LEAP_STREAK, 4));
        assert!(!store.set_max(keys::RECORD_LEAP_STREAK, 3));
        assert!(!store.set_max(keys::RECORD_LEAP_STREAK, 4));
        assert_eq!(store.get_int(keys::RECORD_LEAP_STREAK, 0), 4);
    }

    #[test]
    fn test_add_int_accumulates() {
        let mut store = MemoryStore::new();
        store.add_int(keys::TOTAL_BUGS_EATEN, 3);
        store.add_int(keys::TOTAL_BUGS_EATEN, 2);
        store.add_int(keys::FIREFLIES_EATEN, 0);
        assert_eq!(store.get_int(keys::TOTAL_BUGS_EATEN, 0), 5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::load(&path).unwrap();
        assert_eq!(store.get_int(keys::HIGH_SCORE, 0), 0);
        store.set_int(keys::HIGH_SCORE, 99);
        store.flush().unwrap();

        let reloaded = JsonFileStore::load(&path).unwrap();
        assert_eq!(reloaded.get_int(keys::HIGH_SCORE, 0), 99);
        drop(reloaded);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::load(&path), Err(StoreError::Format(_))));
        let _ = fs::remove_file(&path);
    }
}
