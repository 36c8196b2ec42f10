use std::sync::Arc;

use cyberlearn_core::model::{ActiveUser, UserKey};
use storage::records::read_raw;
use storage::{KeyValueStore, keys};

use crate::error::ProgressError;

/// Reads and clears the identity markers written by the login flow.
///
/// Unreadable storage counts as "nobody signed in".
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn KeyValueStore>,
}

impl IdentityService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Lower-cased email of the signed-in learner.
    #[must_use]
    pub fn active_user_key(&self) -> Option<UserKey> {
        read_raw(self.store.as_ref(), keys::CURRENT_USER_EMAIL)
            .and_then(|email| UserKey::from_email(&email))
    }

    #[must_use]
    pub fn active_user(&self) -> Option<ActiveUser> {
        let email = read_raw(self.store.as_ref(), keys::CURRENT_USER_EMAIL);
        let name = read_raw(self.store.as_ref(), keys::CURRENT_USER_NAME);
        ActiveUser::from_markers(email.as_deref(), name.as_deref())
    }

    /// Removes both identity markers. Stored progress is kept for the next login.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a marker cannot be removed.
    pub fn logout(&self) -> Result<(), ProgressError> {
        self.store.remove(keys::CURRENT_USER_EMAIL)?;
        self.store.remove(keys::CURRENT_USER_NAME)?;
        tracing::info!("identity markers cleared");
        Ok(())
    }
}
