//! Vault container format.
//!
//! A vault holds exactly one encrypted document: a fixed-width header
//! (magic, version, KDF parameter block, nonce, ciphertext length), the
//! XChaCha20-Poly1305 ciphertext and tag, and a length-prefixed metadata
//! block recording the document's original extension. The header and the
//! metadata block are bound to the tag as associated data.
//!
//! - `format`: byte layout, strict parsing, header inspection
//! - `codec`: sealing and unsealing

mod codec;
mod format;

pub use codec::{decode, decode_with_key, encode, unseal, Decoded};
pub use format::{
    inspect, HeaderSummary, Metadata, FORMAT_VERSION, HEADER_LENGTH, MAGIC, MAX_EXTENSION_LENGTH,
    NONCE_LENGTH, TAG_LENGTH,
};

/// Extension used for vault files unless configured otherwise.
pub const DEFAULT_VAULT_EXTENSION: &str = "nbv";
