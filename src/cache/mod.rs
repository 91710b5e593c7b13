//! Persistent course cache
//!
//! A small key-value abstraction (`KeyValueStore`) with two fixed keys: the
//! serialized record set plus its last-modified value, and the time the
//! entry was written. An entry older than the freshness window is a miss.
//!
//! Writes are best-effort: callers log failures and carry on with the
//! in-memory data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{CacheError, CacheResult};
use crate::models::Course;

pub const DATA_KEY: &str = "course_data";
pub const TIMESTAMP_KEY: &str = "course_data_timestamp";

/// Minimal string key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

impl KeyValueStore for Box<dyn KeyValueStore> {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key)
    }
}

/// One file per key under a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    directory: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::read_failed(key, e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|e| CacheError::write_failed(key, e.to_string()))?;
        std::fs::write(self.path_for(key), value)
            .map_err(|e| CacheError::write_failed(key, e.to_string()))
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::write_failed(key, e.to_string())),
        }
    }
}

/// In-memory store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once the total size would exceed `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Entries stay consistent even if a holder panicked mid-insert
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.lock();
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if used + value.len() > quota {
                return Err(CacheError::write_failed(
                    key,
                    format!("quota exceeded ({} bytes)", quota),
                ));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// What lives under `DATA_KEY`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCourses {
    pub records: Vec<Course>,
    pub last_modified: DateTime<Utc>,
}

/// Cache of normalized courses with a freshness window
pub struct CourseCache<S: KeyValueStore> {
    store: S,
    freshness: Duration,
}

impl<S: KeyValueStore> CourseCache<S> {
    pub fn new(store: S, freshness: Duration) -> Self {
        Self { store, freshness }
    }

    /// Valid entry, or `None` on a miss (absent, stale, unreadable)
    pub fn get(&self, now: DateTime<Utc>) -> Option<CachedCourses> {
        let stored_at = match self.stored_at() {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                debug!("Course cache empty");
                return None;
            }
            Err(e) => {
                warn!("Ignoring course cache: {}", e);
                return None;
            }
        };

        let age = now.signed_duration_since(stored_at);
        let window = chrono::Duration::from_std(self.freshness).unwrap_or(chrono::Duration::MAX);
        if age < chrono::Duration::zero() || age >= window {
            debug!("Course cache stale (stored at {})", stored_at);
            return None;
        }

        match self.read_entry() {
            Ok(Some(entry)) => {
                debug!("Course cache hit: {} records", entry.records.len());
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring course cache: {}", e);
                None
            }
        }
    }

    /// Write the entry and its timestamp
    pub fn put(
        &self,
        records: &[Course],
        last_modified: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CacheResult<()> {
        let entry = serde_json::to_string(&CachedEntryRef {
            records,
            last_modified,
        })?;
        self.store.set(DATA_KEY, &entry)?;
        // Timestamp last, so a failed data write never looks fresh
        self.store
            .set(TIMESTAMP_KEY, &now.timestamp_millis().to_string())
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.store.remove(TIMESTAMP_KEY)?;
        self.store.remove(DATA_KEY)
    }

    fn stored_at(&self) -> CacheResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(TIMESTAMP_KEY)? else {
            return Ok(None);
        };
        let millis: i64 = raw.trim().parse().map_err(|_| {
            CacheError::read_failed(TIMESTAMP_KEY, format!("not a timestamp: '{}'", raw))
        })?;
        Ok(DateTime::from_timestamp_millis(millis))
    }

    fn read_entry(&self) -> CacheResult<Option<CachedCourses>> {
        let Some(raw) = self.store.get(DATA_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Corrupt {
                key: DATA_KEY.to_string(),
                source,
            })
    }
}

#[derive(Serialize)]
struct CachedEntryRef<'a> {
    records: &'a [Course],
    last_modified: DateTime<Utc>,
}
