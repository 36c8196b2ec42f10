use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by key-value adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Logical keys of the persisted records.
pub mod keys {
    /// JSON object: lower-cased email → progress state.
    pub const PROGRESS: &str = "cyberlearn_progress_v1";
    /// JSON object: email → account record.
    pub const ACCOUNTS: &str = "osafe_accounts";
    /// Plain string written by the login flow.
    pub const CURRENT_USER_EMAIL: &str = "osafe_currentUserEmail";
    /// Plain string written by the login flow.
    pub const CURRENT_USER_NAME: &str = "osafe_currentUserName";
}

/// Synchronous string store keyed by name, the shape of browser `localStorage`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store for tests and hosts without persistence.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = InMemoryStore::new();
        assert_eq!(store.get(keys::CURRENT_USER_EMAIL).unwrap(), None);

        store.set(keys::CURRENT_USER_EMAIL, "ada@example.com").unwrap();
        assert_eq!(
            store.get(keys::CURRENT_USER_EMAIL).unwrap().as_deref(),
            Some("ada@example.com")
        );

        store.remove(keys::CURRENT_USER_EMAIL).unwrap();
        store.remove(keys::CURRENT_USER_EMAIL).unwrap();
        assert_eq!(store.get(keys::CURRENT_USER_EMAIL).unwrap(), None);
    }

    #[test]
    fn clones_share_contents() {
        let store = InMemoryStore::with_entries([(keys::CURRENT_USER_NAME, "Ada")]);
        let other = store.clone();
        other.set(keys::CURRENT_USER_NAME, "Grace").unwrap();
        assert_eq!(store.get(keys::CURRENT_USER_NAME).unwrap().as_deref(), Some("Grace"));
    }

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryStore>();
    }
}
