//! One-shot encrypt and decrypt of whole files, and the sealing steps the
//! edit session shares with them.

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::{derive, validate_passphrase, KdfParams, KdfProfile, KeyMaterial, Secret};
use crate::error::{NbiasError, Result};
use crate::fs::write_atomic;
use crate::session::{SecretPurpose, SecretProvider};
use crate::vault::{decode, decode_with_key, encode, inspect, Decoded, Metadata};

/// Derive key material for a brand-new container.
///
/// Passphrases must pass [`validate_passphrase`] here; existing containers
/// are opened with whatever passphrase sealed them.
pub fn new_key(secret: &Secret, profile: KdfProfile) -> Result<KeyMaterial> {
    if let Some(passphrase) = secret.expose_passphrase() {
        validate_passphrase(passphrase)?;
    }
    let params = KdfParams::for_new_container(secret, profile)?;
    derive(secret, &params)
}

/// Seal `plaintext`, write it atomically to `path`, then read the file back
/// and confirm it opens to the same bytes under `key`.
pub fn write_verified(
    path: &Path,
    plaintext: &[u8],
    key: &KeyMaterial,
    metadata: &Metadata,
) -> Result<()> {
    let sealed = encode(plaintext, key, metadata)?;
    write_atomic(path, &sealed)?;

    let written = fs::read(path).map_err(|e| NbiasError::io("read back vault", e))?;
    let check = decode_with_key(&written, key)?;
    if check.plaintext.as_slice() != plaintext || &check.metadata != metadata {
        return Err(NbiasError::IoFailure(format!(
            "vault read back from {} does not match what was written",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), bytes = written.len(), "vault written and verified");
    Ok(())
}

/// Parameters for [`encrypt_file`].
#[derive(Debug, Clone)]
pub struct EncryptRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Recorded in the header; defaults to the input's extension.
    pub orig_extension: Option<String>,
    pub profile: KdfProfile,
    /// Replace an existing output file.
    pub force: bool,
}

/// Encrypt a plaintext file into a new vault container.
pub fn encrypt_file(request: &EncryptRequest, secrets: &mut dyn SecretProvider) -> Result<()> {
    refuse_existing(&request.output, request.force)?;

    let extension = request
        .orig_extension
        .clone()
        .or_else(|| extension_of(&request.input));
    let metadata = match extension.as_deref() {
        Some(ext) => Metadata::with_extension(ext)?,
        None => Metadata::default(),
    };
    let plaintext = Zeroizing::new(
        fs::read(&request.input).map_err(|e| NbiasError::io("read input", e))?,
    );

    let secret = secrets.provide(SecretPurpose::Create)?;
    let key = new_key(&secret, request.profile)?;
    write_verified(&request.output, &plaintext, &key, &metadata)?;
    tracing::info!(
        input = %request.input.display(),
        output = %request.output.display(),
        "encrypted"
    );
    Ok(())
}

/// Decrypt a vault container into memory.
///
/// The header is parsed before any secret is requested, so a file that is
/// not a vault fails without prompting.
pub fn decrypt_file(input: &Path, secrets: &mut dyn SecretProvider) -> Result<Decoded> {
    let bytes = fs::read(input).map_err(|e| NbiasError::io("read vault", e))?;
    inspect(&bytes)?;
    let secret = secrets.provide(SecretPurpose::Open)?;
    decode(&bytes, &secret)
}

/// Write decrypted plaintext to `output` with owner-only permissions.
pub fn write_plaintext(output: &Path, plaintext: &[u8], force: bool) -> Result<()> {
    refuse_existing(output, force)?;
    write_atomic(output, plaintext)
}

fn refuse_existing(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(NbiasError::PolicyRejected(format!(
            "{} already exists",
            path.display()
        )));
    }
    Ok(())
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
}
