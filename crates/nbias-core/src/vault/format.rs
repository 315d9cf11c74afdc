//! Byte layout of a vault container.
//!
//! All integers are little-endian.
//!
//! ```text
//! offset  size  field
//!      0     4  magic "NBV\x1a"
//!      4     1  format version
//!      5     1  KDF algorithm id
//!      6     1  KDF profile id (0 for raw keys)
//!      7     4  Argon2 memory cost, KiB
//!     11     4  Argon2 iterations
//!     15     4  Argon2 parallelism
//!     19    16  salt
//!     35    24  nonce
//!     59     8  ciphertext length n
//!     67     n  ciphertext
//!   67+n    16  tag
//!   83+n     2  metadata length m
//!   85+n     m  metadata (UTF-8 original extension)
//! ```

use serde::Serialize;

use crate::crypto::{KdfAlgorithm, KdfParams, KdfProfile, SALT_LENGTH};
use crate::error::{NbiasError, Result};

pub const MAGIC: [u8; 4] = *b"NBV\x1a";
pub const FORMAT_VERSION: u8 = 1;
pub const NONCE_LENGTH: usize = 24;
pub const TAG_LENGTH: usize = 16;
pub const HEADER_LENGTH: usize = 67;
pub const MAX_EXTENSION_LENGTH: usize = 255;

/// Authenticated, non-secret document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub original_extension: Option<String>,
}

impl Metadata {
    /// Metadata recording `extension` (a single leading dot is dropped).
    pub fn with_extension(extension: &str) -> Result<Self> {
        let trimmed = extension.strip_prefix('.').unwrap_or(extension);
        validate_extension(trimmed).map_err(|reason| {
            NbiasError::PolicyRejected(format!("extension {:?} {}", extension, reason))
        })?;
        Ok(Self {
            original_extension: Some(trimmed.to_string()),
        })
    }

    pub(crate) fn encode_block(&self) -> Vec<u8> {
        let ext = self.original_extension.as_deref().unwrap_or("");
        let mut block = Vec::with_capacity(2 + ext.len());
        block.extend_from_slice(&(ext.len() as u16).to_le_bytes());
        block.extend_from_slice(ext.as_bytes());
        block
    }
}

fn validate_extension(ext: &str) -> std::result::Result<(), &'static str> {
    if ext.is_empty() {
        return Err("is empty");
    }
    if ext.len() > MAX_EXTENSION_LENGTH {
        return Err("is too long");
    }
    if ext.starts_with('.') {
        return Err("starts with a dot");
    }
    if ext.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err("contains a path separator or control character");
    }
    Ok(())
}

/// Fixed-width header preceding the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub kdf: KdfParams,
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext_len: u64,
}

impl Header {
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut out = [0u8; HEADER_LENGTH];
        out[0..4].copy_from_slice(&MAGIC);
        out[4] = FORMAT_VERSION;
        out[5] = self.kdf.algorithm.id();
        out[6] = self.kdf.profile.map(KdfProfile::id).unwrap_or(0);
        out[7..11].copy_from_slice(&self.kdf.memory_kib.to_le_bytes());
        out[11..15].copy_from_slice(&self.kdf.iterations.to_le_bytes());
        out[15..19].copy_from_slice(&self.kdf.parallelism.to_le_bytes());
        out[19..35].copy_from_slice(&self.kdf.salt);
        out[35..59].copy_from_slice(&self.nonce);
        out[59..67].copy_from_slice(&self.ciphertext_len.to_le_bytes());
        out
    }
}

/// A structurally valid container, borrowed from its source bytes.
pub(crate) struct ParsedContainer<'a> {
    pub header: Header,
    pub ciphertext: &'a [u8],
    pub tag: [u8; TAG_LENGTH],
    pub metadata: Metadata,
    /// Header bytes followed by the metadata block.
    pub associated_data: Vec<u8>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                NbiasError::malformed(format!(
                    "truncated while reading {} at offset {}",
                    what, self.offset
                ))
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

/// Parse the full container structure without touching any key.
pub(crate) fn parse(bytes: &[u8]) -> Result<ParsedContainer<'_>> {
    let mut reader = Reader::new(bytes);

    let magic: [u8; 4] = reader.array("magic")?;
    if magic != MAGIC {
        return Err(NbiasError::malformed("bad magic bytes"));
    }
    let version = reader.u8("version")?;
    if version != FORMAT_VERSION {
        return Err(NbiasError::UnsupportedVersion(version));
    }

    let algorithm_id = reader.u8("kdf algorithm")?;
    let algorithm = KdfAlgorithm::from_id(algorithm_id)
        .ok_or_else(|| NbiasError::malformed(format!("unknown kdf algorithm {}", algorithm_id)))?;
    let profile_id = reader.u8("kdf profile")?;
    let profile = match profile_id {
        0 => None,
        id => Some(
            KdfProfile::from_id(id)
                .ok_or_else(|| NbiasError::malformed(format!("unknown kdf profile {}", id)))?,
        ),
    };
    let memory_kib = reader.u32("memory cost")?;
    let iterations = reader.u32("iterations")?;
    let parallelism = reader.u32("parallelism")?;
    let salt: [u8; SALT_LENGTH] = reader.array("salt")?;
    let kdf = KdfParams {
        algorithm,
        profile,
        memory_kib,
        iterations,
        parallelism,
        salt,
    };
    kdf.validate()?;

    let nonce: [u8; NONCE_LENGTH] = reader.array("nonce")?;
    let ciphertext_len = reader.u64("ciphertext length")?;
    let ct_len = usize::try_from(ciphertext_len)
        .ok()
        .filter(|len| *len <= reader.remaining())
        .ok_or_else(|| {
            NbiasError::malformed(format!(
                "ciphertext length {} exceeds container size",
                ciphertext_len
            ))
        })?;

    let ciphertext = reader.take(ct_len, "ciphertext")?;
    let tag: [u8; TAG_LENGTH] = reader.array("tag")?;

    let metadata_start = reader.offset;
    let metadata_len = reader.u16("metadata length")? as usize;
    let metadata_bytes = reader.take(metadata_len, "metadata")?;
    if reader.remaining() != 0 {
        return Err(NbiasError::malformed(format!(
            "{} trailing bytes after metadata",
            reader.remaining()
        )));
    }
    let metadata = parse_metadata(metadata_bytes)?;

    let mut associated_data = Vec::with_capacity(HEADER_LENGTH + 2 + metadata_len);
    associated_data.extend_from_slice(&bytes[..HEADER_LENGTH]);
    associated_data.extend_from_slice(&bytes[metadata_start..]);

    Ok(ParsedContainer {
        header: Header {
            kdf,
            nonce,
            ciphertext_len,
        },
        ciphertext,
        tag,
        metadata,
        associated_data,
    })
}

fn parse_metadata(bytes: &[u8]) -> Result<Metadata> {
    if bytes.is_empty() {
        return Ok(Metadata::default());
    }
    let ext = std::str::from_utf8(bytes)
        .map_err(|_| NbiasError::malformed("metadata is not valid UTF-8"))?;
    validate_extension(ext)
        .map_err(|reason| NbiasError::malformed(format!("stored extension {}", reason)))?;
    Ok(Metadata {
        original_extension: Some(ext.to_string()),
    })
}

/// Structural header fields, readable without any secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSummary {
    pub version: u8,
    pub kdf_algorithm: KdfAlgorithm,
    pub kdf_profile: Option<KdfProfile>,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt_length: usize,
    pub nonce_length: usize,
    pub ciphertext_length: u64,
    pub tag_length: usize,
    pub original_extension: Option<String>,
}

/// Read the unauthenticated header of a container.
///
/// No key is derived and the tag is not checked, so nothing here proves the
/// container is genuine. Malformed input fails with the same error kinds as
/// a full decode.
pub fn inspect(bytes: &[u8]) -> Result<HeaderSummary> {
    let parsed = parse(bytes)?;
    let kdf = &parsed.header.kdf;
    Ok(HeaderSummary {
        version: FORMAT_VERSION,
        kdf_algorithm: kdf.algorithm,
        kdf_profile: kdf.profile,
        memory_kib: kdf.memory_kib,
        iterations: kdf.iterations,
        parallelism: kdf.parallelism,
        salt_length: SALT_LENGTH,
        nonce_length: NONCE_LENGTH,
        ciphertext_length: parsed.header.ciphertext_len,
        tag_length: TAG_LENGTH,
        original_extension: parsed.metadata.original_extension,
    })
}
