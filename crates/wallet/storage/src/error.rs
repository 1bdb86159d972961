use thiserror::Error;

/// Errors that may occur while interacting with wallet storage.
///
/// This enum is used across all implementations of [`KeyValStore`](crate::KeyValStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored object could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Database(err.into_string())
    }
}
