//! JSON records on top of a [`KeyValueStore`].
//!
//! Reads are fail-soft: a backend that cannot be read behaves like an empty
//! one, and callers pick their own fallback for unparsable values.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{KeyValueStore, StorageError};

/// Raw value under `key`, or `None` if missing or unreadable.
#[must_use]
pub fn read_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store.get(key).unwrap_or_else(|err| {
        tracing::warn!(key, error = %err, "storage read failed; treating value as missing");
        None
    })
}

/// Parse a stored JSON value.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if `raw` is not valid JSON for `T`.
pub fn parse_record<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Read and parse `key`. `Ok(None)` when nothing is stored.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the stored value does not parse.
pub fn read_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    read_raw(store, key).map(|raw| parse_record(&raw)).transpose()
}

/// Serialize `value` and store it under `key` in a single write.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn write_record<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    store.set(key, &raw)
}
