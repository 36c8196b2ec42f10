use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed view of one stored account record.
///
/// `password` holds plaintext while `encrypted` is false and the obfuscated
/// form once it is true. Missing fields read as empty; a record without the
/// flag counts as plaintext. `createdAt` and any fields the login flow adds
/// are carried as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All accounts as stored, keyed by the email they were registered with.
///
/// Kept as raw JSON so records written by the login flow round-trip verbatim.
pub type AccountCollection = Map<String, Value>;

/// Whether a stored record carries a truthy `encrypted` flag.
///
/// Follows the browser's truthiness: `false`, `null`, `0`, `""` and a missing
/// flag all mean plaintext.
#[must_use]
pub fn is_marked_encrypted(record: &Value) -> bool {
    match record.get("encrypted") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Read-only tally used to decide whether migration should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncryptionStats {
    pub total: u32,
    pub encrypted: u32,
    pub unencrypted: u32,
    pub percentage: u32,
}

impl EncryptionStats {
    #[must_use]
    pub fn from_accounts(accounts: &AccountCollection) -> Self {
        let total = u32::try_from(accounts.len()).unwrap_or(u32::MAX);
        let encrypted = u32::try_from(accounts.values().filter(|a| is_marked_encrypted(a)).count())
            .unwrap_or(u32::MAX)
            .min(total);
        Self {
            total,
            encrypted,
            unencrypted: total - encrypted,
            percentage: rounded_percentage(encrypted, total),
        }
    }

    #[must_use]
    pub fn needs_migration(&self) -> bool {
        self.unencrypted > 0
    }
}

/// Summary returned by a migration pass. Never an error: failures are
/// reported with `success == false` and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub success: bool,
    pub count: u32,
    pub message: String,
}

impl MigrationReport {
    #[must_use]
    pub fn migrated(count: u32) -> Self {
        Self {
            success: true,
            count,
            message: format!("Encrypted {count} account(s)"),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            message: message.into(),
        }
    }
}

// Round half up, as the browser's Math.round does for non-negative values.
fn rounded_percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (u64::from(part), u64::from(total));
    u32::try_from((part * 200 + total) / (total * 2)).unwrap_or(100)
}
