//! Sealing and unsealing vault containers with XChaCha20-Poly1305.

use std::fmt;

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{Key, Tag, XChaCha20Poly1305, XNonce};
use zeroize::Zeroizing;

use crate::crypto::{derive, KeyMaterial, Secret};
use crate::error::{NbiasError, Result};
use crate::vault::format::{parse, Header, Metadata, ParsedContainer, NONCE_LENGTH};

/// Authenticated plaintext recovered from a container.
pub struct Decoded {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub metadata: Metadata,
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("plaintext", &format_args!("[{} bytes REDACTED]", self.plaintext.len()))
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Seal `plaintext` under `key`.
///
/// A fresh random 192-bit nonce is drawn for every call, so resealing the
/// same plaintext under the same key never repeats a nonce. The header
/// records the key's own KDF parameters.
pub fn encode(plaintext: &[u8], key: &KeyMaterial, metadata: &Metadata) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| NbiasError::Crypto(format!("nonce generation failed: {}", e)))?;

    let header = Header {
        kdf: key.params().clone(),
        nonce,
        ciphertext_len: plaintext.len() as u64,
    };
    let header_bytes = header.to_bytes();
    let metadata_block = metadata.encode_block();

    let mut associated_data = Vec::with_capacity(header_bytes.len() + metadata_block.len());
    associated_data.extend_from_slice(&header_bytes);
    associated_data.extend_from_slice(&metadata_block);

    // Encrypted in place; the buffer briefly holds plaintext.
    let mut buffer = Zeroizing::new(plaintext.to_vec());
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(&nonce), &associated_data, &mut buffer)
        .map_err(|_| NbiasError::Crypto("encryption failed".to_string()))?;

    let mut out =
        Vec::with_capacity(header_bytes.len() + buffer.len() + tag.len() + metadata_block.len());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&buffer);
    out.extend_from_slice(tag.as_slice());
    out.extend_from_slice(&metadata_block);
    Ok(out)
}

/// Decode a container with the caller's secret.
///
/// The key is re-derived from the header's own KDF parameters. Any tag
/// mismatch, whether from a wrong secret or altered bytes, yields
/// `AuthenticationFailed` and no plaintext.
pub fn decode(bytes: &[u8], secret: &Secret) -> Result<Decoded> {
    unseal(bytes, secret).map(|(decoded, _key)| decoded)
}

/// Like [`decode`], but also hands back the derived key so the caller can
/// reseal without paying for derivation twice.
pub fn unseal(bytes: &[u8], secret: &Secret) -> Result<(Decoded, KeyMaterial)> {
    let parsed = parse(bytes)?;
    let key = derive(secret, &parsed.header.kdf)?;
    let decoded = open(&parsed, &key)?;
    Ok((decoded, key))
}

/// Decode with key material already in memory.
///
/// Used to verify a freshly written container. The header's KDF block must
/// match the key's parameters exactly.
pub fn decode_with_key(bytes: &[u8], key: &KeyMaterial) -> Result<Decoded> {
    let parsed = parse(bytes)?;
    if &parsed.header.kdf != key.params() {
        return Err(NbiasError::AuthenticationFailed);
    }
    open(&parsed, key)
}

fn open(parsed: &ParsedContainer<'_>, key: &KeyMaterial) -> Result<Decoded> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let mut buffer = Zeroizing::new(parsed.ciphertext.to_vec());
    // The tag is verified before any byte of the buffer is decrypted.
    cipher
        .decrypt_in_place_detached(
            XNonce::from_slice(&parsed.header.nonce),
            &parsed.associated_data,
            &mut buffer,
            Tag::from_slice(&parsed.tag),
        )
        .map_err(|_| NbiasError::AuthenticationFailed)?;

    Ok(Decoded {
        plaintext: buffer,
        metadata: parsed.metadata.clone(),
    })
}
