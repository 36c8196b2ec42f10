use std::sync::Arc;

use cyberlearn_core::Obfuscator;
use cyberlearn_core::model::{CoreSettings, CoreSettingsDraft, MigrationReport};
use storage::KeyValueStore;

use crate::Clock;
use crate::credential_service::CredentialService;
use crate::error::AppServicesError;
use crate::identity_service::IdentityService;
use crate::progress_service::ProgressService;
use crate::session_service::SessionTimeoutService;

/// Everything a page needs, wired to one store.
///
/// Construction runs the startup migration policy: if any stored account is
/// still plaintext, all of them are obfuscated once.
pub struct AppServices {
    clock: Clock,
    progress: Arc<ProgressService>,
    credentials: Arc<CredentialService>,
    session: SessionTimeoutService,
    startup_migration: Option<MigrationReport>,
}

impl AppServices {
    #[must_use]
    pub fn start(store: Arc<dyn KeyValueStore>, clock: Clock, settings: CoreSettings) -> Self {
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&store)));
        let credentials = Arc::new(CredentialService::new(
            Arc::clone(&store),
            Obfuscator::new(&settings.credentials),
        ));
        let session =
            SessionTimeoutService::new(IdentityService::new(Arc::clone(&store)), settings.session);

        let startup_migration = credentials.run_startup_migration();
        if let Some(report) = &startup_migration {
            tracing::info!(
                success = report.success,
                count = report.count,
                message = %report.message,
                "startup account migration"
            );
        }

        Self {
            clock,
            progress,
            credentials,
            session,
            startup_migration,
        }
    }

    /// Like [`Self::start`], with settings read from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the document does not parse or the
    /// settings are invalid.
    pub fn from_settings_json(
        store: Arc<dyn KeyValueStore>,
        clock: Clock,
        settings_json: &str,
    ) -> Result<Self, AppServicesError> {
        let draft: CoreSettingsDraft = serde_json::from_str(settings_json)?;
        let settings = draft.validate().map_err(cyberlearn_core::Error::from)?;
        Ok(Self::start(store, clock, settings))
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn credentials(&self) -> Arc<CredentialService> {
        Arc::clone(&self.credentials)
    }

    #[must_use]
    pub fn session(&self) -> &SessionTimeoutService {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionTimeoutService {
        &mut self.session
    }

    /// Report of the migration run during construction, if one was needed.
    #[must_use]
    pub fn startup_migration(&self) -> Option<&MigrationReport> {
        self.startup_migration.as_ref()
    }
}
