use std::sync::Arc;

use cyberlearn_core::Obfuscator;
use cyberlearn_core::model::{AccountCollection, EncryptionStats, MigrationReport, is_marked_encrypted};
use serde_json::Value;
use storage::records::{parse_record, read_raw, write_record};
use storage::{KeyValueStore, keys};

/// Obfuscation bookkeeping over the stored account collection.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn KeyValueStore>,
    obfuscator: Obfuscator,
}

impl CredentialService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, obfuscator: Obfuscator) -> Self {
        Self { store, obfuscator }
    }

    #[must_use]
    pub fn obfuscator(&self) -> &Obfuscator {
        &self.obfuscator
    }

    /// Tally of obfuscated vs plaintext accounts. All zero when the
    /// collection is missing or unreadable.
    #[must_use]
    pub fn encryption_stats(&self) -> EncryptionStats {
        match self.load_accounts() {
            Some(Ok(accounts)) => EncryptionStats::from_accounts(&accounts),
            Some(Err(_)) | None => EncryptionStats::default(),
        }
    }

    /// Obfuscate every plaintext account and write the collection back once.
    ///
    /// Already obfuscated accounts pass through untouched, so a second run
    /// reports zero. Only `password` and `encrypted` change on migrated
    /// records; every other stored field is written back as read. Failures
    /// are reported, never raised, and leave storage as it was.
    #[must_use]
    pub fn migrate_all_accounts(&self) -> MigrationReport {
        let mut accounts = match self.load_accounts() {
            None => return MigrationReport::failed("No accounts found"),
            Some(Err(message)) => return MigrationReport::failed(message),
            Some(Ok(accounts)) => accounts,
        };

        let mut count = 0_u32;
        for (email, record) in &mut accounts {
            if is_marked_encrypted(record) {
                continue;
            }
            let Value::Object(fields) = record else {
                tracing::debug!(email = email.as_str(), "skipping non-object account record");
                continue;
            };
            if let Err(err) = self.obfuscator.obfuscate_record(fields) {
                tracing::warn!(error = %err, "account migration aborted");
                return MigrationReport::failed(err.to_string());
            }
            count += 1;
        }

        if let Err(err) = write_record(self.store.as_ref(), keys::ACCOUNTS, &accounts) {
            tracing::warn!(error = %err, "account migration could not be written");
            return MigrationReport::failed(err.to_string());
        }

        tracing::info!(count, "account migration complete");
        MigrationReport::migrated(count)
    }

    /// Startup policy: migrate once if any plaintext account remains.
    #[must_use]
    pub fn run_startup_migration(&self) -> Option<MigrationReport> {
        let stats = self.encryption_stats();
        if stats.needs_migration() {
            Some(self.migrate_all_accounts())
        } else {
            None
        }
    }

    fn load_accounts(&self) -> Option<Result<AccountCollection, String>> {
        let raw = read_raw(self.store.as_ref(), keys::ACCOUNTS)?;
        Some(parse_record::<AccountCollection>(&raw).map_err(|err| {
            tracing::warn!(error = %err, "account collection unreadable");
            err.to_string()
        }))
    }
}
