use crate::StorageError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::error;

/// A byte-level key/value store.
///
/// Implementations guarantee atomicity for a single key only: a `set` either
/// replaces the previous value entirely or leaves it untouched. No
/// transactional guarantee spans multiple keys.
#[async_trait]
pub trait KeyValStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Removes the value stored under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: KeyValStore + ?Sized> KeyValStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }
}

/// Typed access to a [`KeyValStore`].
///
/// Objects are encoded as JSON.
#[async_trait]
pub trait KeyValStoreExt: KeyValStore {
    /// Loads and decodes the object stored under `key`, if any.
    async fn get_object<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send + 'static;

    /// Encodes and stores `value` under `key`.
    async fn set_object<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync + ?Sized;

    /// Removes the object stored under `key`.
    async fn remove_object(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: KeyValStore + ?Sized> KeyValStoreExt for S {
    async fn get_object<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&raw).inspect_err(|err| {
            error!(target: "wallet_storage", key, %err, "Failed to decode stored object");
        })?;
        Ok(Some(value))
    }

    async fn set_object<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_vec(value).inspect_err(|err| {
            error!(target: "wallet_storage", key, %err, "Failed to encode object");
        })?;
        self.set(key, raw).await
    }

    async fn remove_object(&self, key: &str) -> Result<(), StorageError> {
        self.remove(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Checkpoint {
        height: u32,
        label: String,
    }

    #[tokio::test]
    async fn test_object_round_trip_through_arc() {
        let store = Arc::new(MemoryStore::default());
        let checkpoint = Checkpoint { height: 12, label: "tip".to_string() };

        store.set_object("CHECKPOINT", &checkpoint).await.expect("set");
        let loaded: Option<Checkpoint> = store.get_object("CHECKPOINT").await.expect("get");
        assert_eq!(loaded, Some(checkpoint));

        store.remove_object("CHECKPOINT").await.expect("remove");
        let loaded: Option<Checkpoint> = store.get_object("CHECKPOINT").await.expect("get");
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_corrupt_object_is_a_serialization_error() {
        let store = MemoryStore::default();
        store.set("CHECKPOINT", b"not json".to_vec()).await.expect("set");

        let result = store.get_object::<Checkpoint>("CHECKPOINT").await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
