//! RocksDB-backed key/value store.

use crate::{KeyValStore, StorageError};
use async_trait::async_trait;
use rocksdb::{DB, Options};
use std::{fmt, path::Path};
use tracing::error;

/// A [`KeyValStore`] persisted in a RocksDB instance.
///
/// Each `set` is a single put, so values are replaced atomically per key.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Creates or opens a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path).inspect_err(|err| {
            error!(target: "wallet_storage", path = %path.display(), %err, "Failed to open database");
        })?;
        Ok(Self { db })
    }
}

impl fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksStore").field("path", &self.db.path()).finish()
    }
}

#[async_trait]
impl KeyValStore for RocksStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get(key.as_bytes()).inspect_err(|err| {
            error!(target: "wallet_storage", key, %err, "Failed to read key");
        })?)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        Ok(self.db.put(key.as_bytes(), value).inspect_err(|err| {
            error!(target: "wallet_storage", key, %err, "Failed to write key");
        })?)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.db.delete(key.as_bytes()).inspect_err(|err| {
            error!(target: "wallet_storage", key, %err, "Failed to delete key");
        })?)
    }
}
