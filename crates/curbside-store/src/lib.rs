//! Persistent key-value store
//!
//! Plays the part browser local storage plays for the map: a flat map of
//! string keys to string values that survives a restart.

mod memory;

pub use memory::MemoryKvStore;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use curbside_types::{Result, StoreError};

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

/// JSON-file backed store, rewritten on every mutation
pub struct FileKvStore {
    store_path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKvStore {
    /// Create or load a store under `store_dir`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join("local_storage.json");

        let entries = if store_path.exists() {
            let file = File::open(&store_path)?;
            let reader = BufReader::new(file);
            match serde_json::from_reader(reader) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %store_path.display(), error = %e, "discarding unreadable store");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            store_path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.store_path
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let file = File::create(&self.store_path)
            .map_err(|e| StoreError::IoError(format!("{}: {}", self.store_path.display(), e)))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, entries)?;
        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock();
        let removed = entries.remove(key).is_some();
        if removed {
            self.persist(&entries)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileKvStore::open(dir.path().to_path_buf()).unwrap();
            store.set("user_latitude", "37.79").unwrap();
            store.set("location_sharing_active", "true").unwrap();
        }
        let store = FileKvStore::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get("user_latitude").unwrap().as_deref(), Some("37.79"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::open(dir.path().to_path_buf()).unwrap();
        store.set("camera_state", "{}").unwrap();
        assert!(store.remove("camera_state").unwrap());
        assert!(!store.remove("camera_state").unwrap());
        assert!(store.get("camera_state").unwrap().is_none());
    }

    #[test]
    fn test_corrupted_file_starts_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("local_storage.json"), "not json").unwrap();
        let store = FileKvStore::open(dir.path().to_path_buf()).unwrap();
        assert!(store.is_empty());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
