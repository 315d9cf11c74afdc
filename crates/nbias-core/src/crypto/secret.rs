//! User-supplied secret material.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::kdf::KEY_LENGTH;
use crate::error::{NbiasError, Result};

/// A passphrase or a raw 256-bit key.
pub enum Secret {
    Passphrase(SecretString),
    RawKey(Zeroizing<[u8; KEY_LENGTH]>),
}

impl Secret {
    /// Wrap a passphrase. Empty passphrases are rejected.
    pub fn passphrase(value: impl Into<String>) -> Result<Self> {
        let value: String = value.into();
        if value.is_empty() {
            return Err(NbiasError::InvalidSecret(
                "passphrase cannot be empty".to_string(),
            ));
        }
        Ok(Secret::Passphrase(SecretString::from(value)))
    }

    /// Parse a raw key from exactly 64 hex digits (surrounding whitespace
    /// is ignored).
    pub fn from_hex(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.len() != KEY_LENGTH * 2 {
            return Err(NbiasError::InvalidSecret(format!(
                "hex key must be {} hex digits (got {})",
                KEY_LENGTH * 2,
                trimmed.len()
            )));
        }
        let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
        hex::decode_to_slice(trimmed, &mut key[..]).map_err(|_| {
            NbiasError::InvalidSecret("hex key contains non-hex characters".to_string())
        })?;
        Ok(Secret::RawKey(key))
    }

    /// Pick the secret from the two optional inputs. A hex key wins when
    /// both are present.
    pub fn resolve(passphrase: Option<&str>, key_hex: Option<&str>) -> Result<Option<Self>> {
        match (key_hex, passphrase) {
            (Some(hex), _) => Self::from_hex(hex).map(Some),
            (None, Some(passphrase)) => Self::passphrase(passphrase).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn is_raw_key(&self) -> bool {
        matches!(self, Secret::RawKey(_))
    }

    /// Passphrase text, if this is a passphrase.
    pub fn expose_passphrase(&self) -> Option<&str> {
        match self {
            Secret::Passphrase(value) => Some(value.expose_secret()),
            Secret::RawKey(_) => None,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Passphrase(_) => f.write_str("Secret::Passphrase([REDACTED])"),
            Secret::RawKey(_) => f.write_str("Secret::RawKey([REDACTED])"),
        }
    }
}
