//! Key derivation using Argon2id.
//!
//! Passphrases are stretched with Argon2id under one of three cost profiles.
//! Raw 256-bit keys bypass the KDF entirely. Either way the result is a
//! [`KeyMaterial`] tagged with the exact parameters that produced it, so a
//! reseal can write the same header back without re-deriving.

use std::fmt;
use std::str::FromStr;

use argon2::Argon2;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::secret::Secret;
use crate::error::{NbiasError, Result};

/// Length of the symmetric key in bytes (XChaCha20-Poly1305).
pub const KEY_LENGTH: usize = 32;

/// Length of the Argon2id salt stored in every container.
pub const SALT_LENGTH: usize = 16;

/// Upper bounds accepted from a container header, checked before any
/// derivation: twice the hardened costs. The header is not authenticated
/// until after the key has been derived.
const MAX_MEMORY_KIB: u32 = 2 * 256 * 1024;
const MAX_ITERATIONS: u32 = 8;
const MAX_PARALLELISM: u32 = 8;

/// Named Argon2id cost tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdfProfile {
    /// Quick interactive edits.
    Fast,
    /// Default for everyday notes.
    #[default]
    Balanced,
    /// Long-term archival.
    Hardened,
}

impl KdfProfile {
    pub const ALL: [KdfProfile; 3] = [KdfProfile::Fast, KdfProfile::Balanced, KdfProfile::Hardened];

    /// Identifier written to the container header.
    pub fn id(self) -> u8 {
        match self {
            KdfProfile::Fast => 1,
            KdfProfile::Balanced => 2,
            KdfProfile::Hardened => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        KdfProfile::ALL.into_iter().find(|profile| profile.id() == id)
    }

    /// Argon2id costs as `(memory KiB, iterations, parallelism)`.
    pub fn costs(self) -> (u32, u32, u32) {
        match self {
            KdfProfile::Fast => (19 * 1024, 2, 1),
            KdfProfile::Balanced => (64 * 1024, 3, 1),
            KdfProfile::Hardened => (256 * 1024, 4, 4),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KdfProfile::Fast => "fast",
            KdfProfile::Balanced => "balanced",
            KdfProfile::Hardened => "hardened",
        }
    }
}

impl fmt::Display for KdfProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KdfProfile {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "fast" => Ok(KdfProfile::Fast),
            "balanced" => Ok(KdfProfile::Balanced),
            "hardened" => Ok(KdfProfile::Hardened),
            other => Err(format!(
                "invalid kdf profile: {} (use fast, balanced or hardened)",
                other
            )),
        }
    }
}

/// How the container key was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KdfAlgorithm {
    Argon2id,
    RawKey,
}

impl KdfAlgorithm {
    pub fn id(self) -> u8 {
        match self {
            KdfAlgorithm::Argon2id => 1,
            KdfAlgorithm::RawKey => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(KdfAlgorithm::Argon2id),
            2 => Some(KdfAlgorithm::RawKey),
            _ => None,
        }
    }
}

/// Everything needed to re-derive a container key from its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    /// `None` only for raw-key containers.
    pub profile: Option<KdfProfile>,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt: [u8; SALT_LENGTH],
}

impl KdfParams {
    /// Argon2id parameters for `profile` with a fresh random salt.
    pub fn for_profile(profile: KdfProfile) -> Result<Self> {
        let mut salt = [0u8; SALT_LENGTH];
        getrandom::getrandom(&mut salt)
            .map_err(|e| NbiasError::Crypto(format!("salt generation failed: {}", e)))?;
        Ok(Self::with_salt(profile, salt))
    }

    /// Argon2id parameters for `profile` with a caller-chosen salt.
    pub fn with_salt(profile: KdfProfile, salt: [u8; SALT_LENGTH]) -> Self {
        let (memory_kib, iterations, parallelism) = profile.costs();
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            profile: Some(profile),
            memory_kib,
            iterations,
            parallelism,
            salt,
        }
    }

    /// Parameters recorded for a container sealed with a raw key.
    pub fn raw_key() -> Self {
        Self {
            algorithm: KdfAlgorithm::RawKey,
            profile: None,
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
            salt: [0u8; SALT_LENGTH],
        }
    }

    /// Parameters for a brand-new container sealed with `secret`.
    pub fn for_new_container(secret: &Secret, profile: KdfProfile) -> Result<Self> {
        match secret {
            Secret::Passphrase(_) => Self::for_profile(profile),
            Secret::RawKey(_) => Ok(Self::raw_key()),
        }
    }

    /// Reject parameter blocks that are inconsistent or out of bounds.
    pub fn validate(&self) -> Result<()> {
        match self.algorithm {
            KdfAlgorithm::Argon2id => {
                if self.profile.is_none() {
                    return Err(NbiasError::malformed("argon2id block without a profile"));
                }
                if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
                    return Err(NbiasError::malformed(format!(
                        "parallelism {} out of range",
                        self.parallelism
                    )));
                }
                if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
                    return Err(NbiasError::malformed(format!(
                        "iterations {} out of range",
                        self.iterations
                    )));
                }
                if self.memory_kib < 8 * self.parallelism || self.memory_kib > MAX_MEMORY_KIB {
                    return Err(NbiasError::malformed(format!(
                        "memory cost {} KiB out of range",
                        self.memory_kib
                    )));
                }
            }
            KdfAlgorithm::RawKey => {
                let zero_costs =
                    self.memory_kib == 0 && self.iterations == 0 && self.parallelism == 0;
                if self.profile.is_some() || !zero_costs || self.salt != [0u8; SALT_LENGTH] {
                    return Err(NbiasError::malformed("raw-key block carries KDF parameters"));
                }
            }
        }
        Ok(())
    }
}

/// A symmetric key plus the parameters that produced it.
///
/// The key bytes are zeroized when this value is dropped; dropping it is how
/// a session erases its key.
pub struct KeyMaterial {
    key: Zeroizing<[u8; KEY_LENGTH]>,
    params: KdfParams,
}

impl KeyMaterial {
    pub(crate) fn new(key: Zeroizing<[u8; KEY_LENGTH]>, params: KdfParams) -> Self {
        Self { key, params }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}

/// Derive key material from `secret` using `params`.
///
/// # Errors
///
/// - `InvalidSecret` when the secret kind does not match the algorithm
/// - `MalformedContainer` when the parameters are out of bounds
/// - `Crypto` when Argon2 rejects the parameters
pub fn derive(secret: &Secret, params: &KdfParams) -> Result<KeyMaterial> {
    params.validate()?;

    match (secret, params.algorithm) {
        (Secret::Passphrase(passphrase), KdfAlgorithm::Argon2id) => {
            let argon_params = argon2::Params::new(
                params.memory_kib,
                params.iterations,
                params.parallelism,
                Some(KEY_LENGTH),
            )
            .map_err(|e| NbiasError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;
            let argon2 =
                Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, argon_params);

            let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
            argon2
                .hash_password_into(
                    passphrase.expose_secret().as_bytes(),
                    &params.salt,
                    &mut key[..],
                )
                .map_err(|e| NbiasError::Crypto(format!("Key derivation failed: {}", e)))?;
            tracing::debug!(
                profile = ?params.profile,
                memory_kib = params.memory_kib,
                iterations = params.iterations,
                parallelism = params.parallelism,
                "derived key with argon2id"
            );
            Ok(KeyMaterial::new(key, params.clone()))
        }
        (Secret::RawKey(raw), KdfAlgorithm::RawKey) => {
            let key = Zeroizing::new(**raw);
            Ok(KeyMaterial::new(key, params.clone()))
        }
        (Secret::Passphrase(_), KdfAlgorithm::RawKey) => Err(NbiasError::InvalidSecret(
            "vault was sealed with a raw key; a hex key is required".to_string(),
        )),
        (Secret::RawKey(_), KdfAlgorithm::Argon2id) => Err(NbiasError::InvalidSecret(
            "vault was sealed with a passphrase; a hex key cannot open it".to_string(),
        )),
    }
}
