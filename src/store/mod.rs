mod series;

use std::path::Path;

use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options, WriteOptions};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, SnapshotError};

pub use series::{bucket_key, ReviewSnapshot, SeriesRecord, SeriesStore};

/// Derives the storage key a value is filed under. Implemented once per
/// stored type; the key function defines partitioning.
pub trait Keyed {
    fn storage_key(&self) -> String;
}

/// Durable key/value store over an embedded ordered engine. One process may
/// hold the store open in read-write mode at a time.
pub struct BucketStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl BucketStore {
    /// Opens the store at `path`, creating it if missing. When `wipe` is set,
    /// all previously persisted state is discarded before the store opens;
    /// wiping while another handle is open is a precondition violation.
    pub fn open(path: impl AsRef<Path>, wipe: bool) -> Result<Self> {
        let path = path.as_ref();
        if wipe && path.exists() {
            DBWithThreadMode::<MultiThreaded>::destroy(&Options::default(), path)
                .map_err(|err| SnapshotError::Storage(err.to_string()))?;
        }

        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DBWithThreadMode::<MultiThreaded>::open(&options, path)
            .map_err(|err| SnapshotError::Storage(err.to_string()))?;

        Ok(Self { db })
    }

    pub fn has_key(&self, key: &str) -> Result<bool> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|err| SnapshotError::Storage(err.to_string()))?;
        Ok(value.is_some())
    }

    /// Fetches and deserializes the value under `key`. Callers must check
    /// `has_key` first or treat `KeyNotFound` as a contract violation.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        match self.get_opt(key)? {
            Some(value) => Ok(value),
            None => Err(SnapshotError::KeyNotFound(key.to_string())),
        }
    }

    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|err| SnapshotError::Storage(err.to_string()))?;
        match value {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Upserts `value` under `key`. The write is synced before returning.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut write_options = WriteOptions::default();
        write_options.set_sync(true);
        self.db
            .put_opt(key.as_bytes(), serde_json::to_vec(value)?, &write_options)
            .map_err(|err| SnapshotError::Storage(err.to_string()))
    }

    /// Every key in the store, in engine order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, _) = item.map_err(|err| SnapshotError::Storage(err.to_string()))?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BucketStore::open(dir.path().join("kv"), false).unwrap();

        store.put("alpha", &"one".to_string()).unwrap();
        assert!(store.has_key("alpha").unwrap());
        assert_eq!(store.get::<String>("alpha").unwrap(), "one");

        store.put("alpha", &"two".to_string()).unwrap();
        assert_eq!(store.get::<String>("alpha").unwrap(), "two");
    }

    #[test]
    fn get_on_missing_key_is_loud() {
        let dir = tempfile::tempdir().unwrap();
        let store = BucketStore::open(dir.path().join("kv"), false).unwrap();

        assert!(!store.has_key("absent").unwrap());
        let err = store.get::<String>("absent").unwrap_err();
        assert!(matches!(err, SnapshotError::KeyNotFound(key) if key == "absent"));
    }

    #[test]
    fn keys_enumerate_in_engine_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = BucketStore::open(dir.path().join("kv"), false).unwrap();

        for key in ["beta", "alpha", "gamma"] {
            store.put(key, &0u32).unwrap();
        }

        assert_eq!(store.keys().unwrap(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn wipe_discards_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv");

        {
            let store = BucketStore::open(&path, false).unwrap();
            store.put("alpha", &1u32).unwrap();
        }
        {
            let store = BucketStore::open(&path, false).unwrap();
            assert!(store.has_key("alpha").unwrap());
        }
        {
            let store = BucketStore::open(&path, true).unwrap();
            assert!(!store.has_key("alpha").unwrap());
        }
    }
}
