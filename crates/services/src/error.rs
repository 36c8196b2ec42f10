//! Shared error types for the services crate.
//!
//! Most operations here are fail-soft and never error. What remains are
//! backend write failures and bad host configuration.

use thiserror::Error;

use storage::StorageError;

/// Errors emitted by `ProgressService` and `IdentityService` writes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while assembling app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error("invalid settings document: {0}")]
    SettingsDocument(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] cyberlearn_core::Error),
}
