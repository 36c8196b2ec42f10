use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_WARNING_AFTER_SECS: u64 = 3 * 60;
pub const DEFAULT_LOGOUT_AFTER_SECS: u64 = 5 * 60;
pub const DEFAULT_SIGN_IN_PATH: &str = "index.html#auth";
pub const DEFAULT_OBFUSCATION_KEY: &str = "CyberLearn2025SecureKey";
/// Longest accepted idle threshold: one week.
pub const MAX_THRESHOLD_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("idle thresholds must be > 0")]
    ZeroThreshold,

    #[error("idle threshold of {secs}s is out of range")]
    ThresholdOutOfRange { secs: u64 },

    #[error("logout threshold ({logout}s) must be greater than warning threshold ({warning}s)")]
    LogoutNotAfterWarning { warning: u64, logout: u64 },

    #[error("obfuscation key cannot be empty")]
    EmptyObfuscationKey,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Idle-timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    warning_after: Duration,
    logout_after: Duration,
    sign_in_path: String,
    logout_notice: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSettingsDraft {
    pub warning_after_secs: Option<u64>,
    pub logout_after_secs: Option<u64>,
    pub sign_in_path: Option<String>,
    pub logout_notice: Option<String>,
}

impl SessionSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill defaults and check the thresholds.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a threshold is zero or exceeds
    /// [`MAX_THRESHOLD_SECS`], or if the logout threshold does not exceed the
    /// warning threshold. Blank text
    /// overrides fall back to defaults.
    pub fn validate(self) -> Result<SessionSettings, SettingsError> {
        let warning_secs = self.warning_after_secs.unwrap_or(DEFAULT_WARNING_AFTER_SECS);
        let logout_secs = self.logout_after_secs.unwrap_or(DEFAULT_LOGOUT_AFTER_SECS);

        if warning_secs == 0 || logout_secs == 0 {
            return Err(SettingsError::ZeroThreshold);
        }
        let warning_after = seconds(warning_secs)?;
        let logout_after = seconds(logout_secs)?;
        if logout_secs <= warning_secs {
            return Err(SettingsError::LogoutNotAfterWarning {
                warning: warning_secs,
                logout: logout_secs,
            });
        }

        let sign_in_path = normalize_optional(self.sign_in_path)
            .unwrap_or_else(|| DEFAULT_SIGN_IN_PATH.to_owned());
        let logout_notice =
            normalize_optional(self.logout_notice).unwrap_or_else(|| default_notice(logout_secs));

        Ok(SessionSettings {
            warning_after,
            logout_after,
            sign_in_path,
            logout_notice,
        })
    }
}

impl SessionSettings {
    #[must_use]
    pub fn warning_after(&self) -> Duration {
        self.warning_after
    }

    #[must_use]
    pub fn logout_after(&self) -> Duration {
        self.logout_after
    }

    /// Where the host navigates after a forced logout.
    #[must_use]
    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    #[must_use]
    pub fn logout_notice(&self) -> &str {
        &self.logout_notice
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            warning_after: Duration::minutes(3),
            logout_after: Duration::minutes(5),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_owned(),
            logout_notice: default_notice(DEFAULT_LOGOUT_AFTER_SECS),
        }
    }
}

//
// ─── CREDENTIALS ───────────────────────────────────────────────────────────────
//

/// Key for the account obfuscation transform.
///
/// Changing it makes previously stored passwords unreadable.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSettings {
    key: String,
}

impl CredentialSettings {
    /// # Errors
    ///
    /// Returns `SettingsError::EmptyObfuscationKey` for an empty key.
    pub fn new(key: impl Into<String>) -> Result<Self, SettingsError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SettingsError::EmptyObfuscationKey);
        }
        Ok(Self { key })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            key: DEFAULT_OBFUSCATION_KEY.to_owned(),
        }
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("key", &"<redacted>")
            .finish()
    }
}

//
// ─── COMBINED ──────────────────────────────────────────────────────────────────
//

/// Everything a host can configure, as loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreSettingsDraft {
    pub session: SessionSettingsDraft,
    pub obfuscation_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreSettings {
    pub session: SessionSettings,
    pub credentials: CredentialSettings,
}

impl CoreSettingsDraft {
    /// # Errors
    ///
    /// Returns `SettingsError` if any section is invalid.
    pub fn validate(self) -> Result<CoreSettings, SettingsError> {
        let credentials = match self.obfuscation_key {
            Some(key) => CredentialSettings::new(key)?,
            None => CredentialSettings::default(),
        };
        Ok(CoreSettings {
            session: self.session.validate()?,
            credentials,
        })
    }
}

fn seconds(secs: u64) -> Result<Duration, SettingsError> {
    Some(secs)
        .filter(|secs| *secs <= MAX_THRESHOLD_SECS)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(Duration::try_seconds)
        .ok_or(SettingsError::ThresholdOutOfRange { secs })
}

fn default_notice(logout_secs: u64) -> String {
    let span = if logout_secs % 60 == 0 {
        format!("{} minutes", logout_secs / 60)
    } else {
        format!("{logout_secs} seconds")
    };
    format!("You have been logged out after {span} of inactivity. Please sign in again to continue.")
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_three_and_five_minutes() {
        let settings = SessionSettingsDraft::new().validate().unwrap();
        assert_eq!(settings.warning_after(), Duration::seconds(180));
        assert_eq!(settings.logout_after(), Duration::seconds(300));
        assert_eq!(settings.sign_in_path(), "index.html#auth");
        assert_eq!(
            settings.logout_notice(),
            "You have been logged out after 5 minutes of inactivity. Please sign in again to continue."
        );
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn logout_must_follow_warning() {
        let draft = SessionSettingsDraft {
            warning_after_secs: Some(300),
            logout_after_secs: Some(300),
            ..SessionSettingsDraft::default()
        };
        assert_eq!(
            draft.validate(),
            Err(SettingsError::LogoutNotAfterWarning {
                warning: 300,
                logout: 300
            })
        );
    }

    #[test]
    fn zero_threshold_rejected() {
        let draft = SessionSettingsDraft {
            warning_after_secs: Some(0),
            ..SessionSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(SettingsError::ZeroThreshold));
    }

    #[test]
    fn huge_threshold_rejected() {
        let draft = SessionSettingsDraft {
            warning_after_secs: Some(1),
            logout_after_secs: Some(u64::MAX),
            ..SessionSettingsDraft::default()
        };
        assert!(matches!(
            draft.validate(),
            Err(SettingsError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn thresholds_are_capped_at_one_week() {
        let at_cap = SessionSettingsDraft {
            warning_after_secs: Some(MAX_THRESHOLD_SECS - 1),
            logout_after_secs: Some(MAX_THRESHOLD_SECS),
            ..SessionSettingsDraft::default()
        };
        assert_eq!(
            at_cap.validate().unwrap().logout_after(),
            Duration::weeks(1)
        );

        let over_cap = SessionSettingsDraft {
            warning_after_secs: Some(60),
            logout_after_secs: Some(MAX_THRESHOLD_SECS + 1),
            ..SessionSettingsDraft::default()
        };
        assert_eq!(
            over_cap.validate(),
            Err(SettingsError::ThresholdOutOfRange {
                secs: MAX_THRESHOLD_SECS + 1
            })
        );

        let huge: CoreSettingsDraft = serde_json::from_str(
            r#"{ "session": { "warningAfterSecs": 60, "logoutAfterSecs": 9223372036854775807 } }"#,
        )
        .unwrap();
        assert!(matches!(
            huge.validate(),
            Err(SettingsError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        let draft = SessionSettingsDraft {
            sign_in_path: Some("   ".into()),
            logout_after_secs: Some(90),
            warning_after_secs: Some(30),
            ..SessionSettingsDraft::default()
        };
        let settings = draft.validate().unwrap();
        assert_eq!(settings.sign_in_path(), DEFAULT_SIGN_IN_PATH);
        assert!(settings.logout_notice().contains("90 seconds"));
    }

    #[test]
    fn core_settings_load_from_json() {
        let draft: CoreSettingsDraft = serde_json::from_str(
            r#"{ "session": { "warningAfterSecs": 60, "logoutAfterSecs": 120 }, "obfuscationKey": "k" }"#,
        )
        .unwrap();
        let settings = draft.validate().unwrap();
        assert_eq!(settings.session.warning_after(), Duration::seconds(60));
        assert_eq!(settings.credentials.key(), "k");
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(
            CredentialSettings::new(""),
            Err(SettingsError::EmptyObfuscationKey)
        );
    }
}
