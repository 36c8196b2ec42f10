//! Reversible obfuscation of stored account passwords.
//!
//! Each UTF-16 code unit of the text is XOR-ed with the key (repeating), the
//! resulting units are taken as Latin-1 bytes and base64 encoded, matching the
//! browser's `btoa`/`atob` pair so previously stored records stay readable.
//!
//! This is NOT encryption. The key ships with the client and anyone who can
//! read storage can reverse it. It exists to keep passwords out of plain
//! sight in storage dumps, nothing more.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, general_purpose};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Account, CredentialSettings};

// `atob` accepts input with or without trailing padding.
const STORAGE_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ObfuscationError {
    #[error("obfuscation key cannot be empty")]
    EmptyKey,

    #[error("character at position {position} cannot be stored (code unit {code_unit:#06x})")]
    UnencodableCharacter { position: usize, code_unit: u16 },

    #[error("stored text is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("stored text does not decode to valid text")]
    InvalidText,
}

/// XOR-plus-base64 transform bound to one key.
#[derive(Clone)]
pub struct Obfuscator {
    key: Vec<u16>,
}

impl Obfuscator {
    #[must_use]
    pub fn new(settings: &CredentialSettings) -> Self {
        Self {
            key: settings.key().encode_utf16().collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `ObfuscationError::EmptyKey` for `""`.
    pub fn with_key(key: &str) -> Result<Self, ObfuscationError> {
        if key.is_empty() {
            return Err(ObfuscationError::EmptyKey);
        }
        Ok(Self {
            key: key.encode_utf16().collect(),
        })
    }

    /// Obfuscates `text`. Empty input yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns `ObfuscationError::UnencodableCharacter` when a masked code unit
    /// falls outside Latin-1, which the storage encoding cannot carry.
    pub fn encrypt(&self, text: &str) -> Result<String, ObfuscationError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let bytes = text
            .encode_utf16()
            .enumerate()
            .map(|(position, unit)| {
                let masked = unit ^ self.key_unit(position);
                u8::try_from(masked).map_err(|_| ObfuscationError::UnencodableCharacter {
                    position,
                    code_unit: masked,
                })
            })
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(STORAGE_ENCODING.encode(bytes))
    }

    /// Reverses [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `ObfuscationError::Decode` for malformed base64 and
    /// `ObfuscationError::InvalidText` if the unmasked units are not valid UTF-16.
    pub fn try_decrypt(&self, encoded: &str) -> Result<String, ObfuscationError> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let bytes = STORAGE_ENCODING.decode(encoded.trim())?;
        let units: Vec<u16> = bytes
            .iter()
            .enumerate()
            .map(|(position, byte)| u16::from(*byte) ^ self.key_unit(position))
            .collect();

        String::from_utf16(&units).map_err(|_| ObfuscationError::InvalidText)
    }

    /// Fail-soft [`Self::try_decrypt`]: malformed input yields `""`.
    #[must_use]
    pub fn decrypt(&self, encoded: &str) -> String {
        self.try_decrypt(encoded).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "decryption failed; returning empty text");
            String::new()
        })
    }

    /// Displayable, non-cryptographic fingerprint of a password.
    ///
    /// # Errors
    ///
    /// Never fails for the default key: the fingerprint is ASCII.
    pub fn weak_fingerprint(&self, password: &str) -> Result<String, ObfuscationError> {
        if password.is_empty() {
            return Ok(String::new());
        }
        self.encrypt(&rolling_hash_text(password))
    }

    /// Copy of `account` with the password obfuscated and the flag set.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::encrypt`] failures.
    pub fn obfuscate_account(&self, account: &Account) -> Result<Account, ObfuscationError> {
        Ok(Account {
            password: self.encrypt(&account.password)?,
            encrypted: true,
            ..account.clone()
        })
    }

    /// Obfuscates a stored record in place, leaving every field other than
    /// `password` and `encrypted` exactly as stored.
    ///
    /// A missing or `null` password is treated as empty text.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::encrypt`] failures; `record` is unchanged on error.
    pub fn obfuscate_record(&self, record: &mut Map<String, Value>) -> Result<(), ObfuscationError> {
        let hidden = match record.get("password") {
            None | Some(Value::Null) => self.encrypt("")?,
            Some(Value::String(text)) => self.encrypt(text)?,
            Some(other) => self.encrypt(&other.to_string())?,
        };
        record.insert("password".to_owned(), Value::String(hidden));
        record.insert("encrypted".to_owned(), Value::Bool(true));
        Ok(())
    }

    /// Copy of `account` with a readable password. Plaintext records pass through.
    #[must_use]
    pub fn deobfuscate_account(&self, account: &Account) -> Account {
        if !account.encrypted {
            return account.clone();
        }
        Account {
            password: self.decrypt(&account.password),
            encrypted: false,
            ..account.clone()
        }
    }

    fn key_unit(&self, position: usize) -> u16 {
        self.key[position % self.key.len()]
    }
}

impl Default for Obfuscator {
    fn default() -> Self {
        Self::new(&CredentialSettings::default())
    }
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator").finish_non_exhaustive()
    }
}

/// `hash * 31 + unit` over UTF-16 units in wrapping i32 arithmetic, rendered
/// as signed hex followed by the decimal unit count.
fn rolling_hash_text(password: &str) -> String {
    let mut hash: i32 = 0;
    let mut len = 0_usize;
    for unit in password.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
        len += 1;
    }

    if hash < 0 {
        format!("-{:x}{len}", hash.unsigned_abs())
    } else {
        format!("{hash:x}{len}")
    }
}
