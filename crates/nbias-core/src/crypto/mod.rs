//! Key derivation and secret handling.
//!
//! - **Argon2id**: memory-hard derivation for passphrases, with three named
//!   cost profiles
//! - **Raw keys**: 256-bit keys supplied as hex, used directly
//!
//! ## Security Model
//!
//! - Key material and secrets are zeroized from memory on drop
//! - `Debug` output of secrets and keys is redacted
//! - The KDF parameters stored in a container are authoritative on decrypt;
//!   the caller's profile choice only applies when a container is created
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted vault file
//! - Offline brute-force attacks on the passphrase
//! - Plaintext lingering on persistent storage after a session
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - An editor that copies the document elsewhere on its own

pub mod kdf;
pub mod passphrase;
pub mod secret;

pub use kdf::{derive, KdfAlgorithm, KdfParams, KdfProfile, KeyMaterial, KEY_LENGTH, SALT_LENGTH};
pub use passphrase::validate_passphrase;
pub use secret::Secret;
