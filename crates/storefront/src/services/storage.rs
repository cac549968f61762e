//! Per-visitor key-value storage.
//!
//! Cart and checkout services persist through [`SessionStorage`]. In the
//! server it is backed by the visitor's `tower_sessions::Session`; tests use
//! [`MemoryStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;

/// Errors reading or writing session values.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("session value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session storage lock poisoned")]
    Poisoned,
}

/// A JSON key-value store scoped to one visitor.
pub trait SessionStorage: Send + Sync {
    /// Read and deserialize `key`. Absent keys are `Ok(None)`.
    fn load<T>(&self, key: &str) -> impl Future<Output = Result<Option<T>, StorageError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Serialize `value` under `key`, replacing any previous value.
    fn store<T>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), StorageError>> + Send
    where
        T: Serialize + Sync;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl SessionStorage for Session {
    async fn load<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.get::<T>(key).await?)
    }

    async fn store<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        Ok(self.insert(key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_value(key).await?;
        Ok(())
    }
}

/// In-process storage for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .is_ok_and(|values| values.contains_key(key))
    }
}

impl SessionStorage for MemoryStorage {
    async fn load<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self
            .values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .get(key)
            .cloned();
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    async fn store<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load::<u32>("count").await.unwrap(), None);

        storage.store("count", &3_u32).await.unwrap();
        assert_eq!(storage.load::<u32>("count").await.unwrap(), Some(3));
        assert!(storage.contains("count"));

        storage.remove("count").await.unwrap();
        storage.remove("count").await.unwrap();
        assert!(!storage.contains("count"));
    }

    #[tokio::test]
    async fn test_memory_storage_type_mismatch_is_error() {
        let storage = MemoryStorage::new();
        storage.store("cart", &"not a number").await.unwrap();
        assert!(matches!(
            storage.load::<u32>("cart").await,
            Err(StorageError::Serialization(_))
        ));
    }
}
