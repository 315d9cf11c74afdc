//! Scratch working copies for decrypted plaintext.
//!
//! A scratch handle owns a private directory (mode 0700, random name) with a
//! single working file inside (mode 0600), created before any plaintext is
//! written. Releasing the handle overwrites every file in that directory,
//! including swap and backup files an editor may have dropped next to the
//! working copy, then removes the directory. Dropping an unreleased handle
//! runs the same release.
//!
//! Placement prefers memory-backed storage: an explicitly configured
//! directory, then `$XDG_RUNTIME_DIR` and `/dev/shm` when they are tmpfs.
//! Under [`TmpfsMode::Prefer`] the persistent temp directory is the logged
//! fallback; under [`TmpfsMode::Never`] it is the only choice.

mod volatile;
mod wipe;

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{NbiasError, Result};
use crate::fs::{create_owner_only, random_token};

pub use volatile::{available_bytes, is_volatile};
pub use wipe::{overwrite, wipe_file, wipe_tree};

/// File name of the working copy inside the private directory.
const WORKING_STEM: &str = "note";

/// Whether scratch space may live on memory-backed storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TmpfsMode {
    #[default]
    Prefer,
    Never,
}

impl TmpfsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TmpfsMode::Prefer => "prefer",
            TmpfsMode::Never => "never",
        }
    }
}

impl fmt::Display for TmpfsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TmpfsMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "prefer" => Ok(TmpfsMode::Prefer),
            "never" => Ok(TmpfsMode::Never),
            other => Err(format!("invalid tmpfs mode: {} (use prefer or never)", other)),
        }
    }
}

/// Kind of storage a scratch handle ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    Volatile,
    Persistent,
}

/// Where scratch directories may be created.
#[derive(Debug, Clone)]
pub struct ScratchPlacement {
    /// Trusted as volatile without probing.
    pub configured: Option<PathBuf>,
    /// Probed with `statfs`; only used when memory-backed.
    pub detected: Vec<PathBuf>,
    /// Fallback on regular storage.
    pub persistent: PathBuf,
}

impl ScratchPlacement {
    /// Standard candidates for this machine.
    pub fn detect(configured: Option<PathBuf>) -> Self {
        let mut detected = Vec::new();
        if let Some(runtime) = std::env::var_os("XDG_RUNTIME_DIR").filter(|v| !v.is_empty()) {
            detected.push(PathBuf::from(runtime));
        }
        detected.push(PathBuf::from("/dev/shm"));
        Self {
            configured,
            detected,
            persistent: std::env::temp_dir(),
        }
    }

    /// Candidate directories in the order they should be tried.
    fn candidates(&self, mode: TmpfsMode, size_hint: u64) -> Vec<(PathBuf, StorageClass)> {
        let mut out = Vec::new();
        if mode == TmpfsMode::Prefer {
            if let Some(dir) = self.configured.as_ref() {
                if dir.is_dir() && has_room(dir, size_hint) {
                    out.push((dir.clone(), StorageClass::Volatile));
                } else {
                    tracing::debug!(dir = %dir.display(), "configured scratch dir unusable");
                }
            }
            for dir in &self.detected {
                if dir.is_dir() && is_volatile(dir) && has_room(dir, size_hint) {
                    out.push((dir.clone(), StorageClass::Volatile));
                }
            }
        }
        out.push((self.persistent.clone(), StorageClass::Persistent));
        out
    }
}

fn has_room(dir: &Path, size_hint: u64) -> bool {
    match available_bytes(dir) {
        // Leave headroom for editor swap files.
        Some(free) => free / 2 >= size_hint,
        None => true,
    }
}

/// A content snapshot of the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
    pub digest: [u8; 32],
}

impl Fingerprint {
    /// Whether the content differs, regardless of timestamps.
    pub fn content_differs(&self, other: &Fingerprint) -> bool {
        self.len != other.len || self.digest != other.digest
    }
}

/// Exclusive handle on a scratch working copy.
#[derive(Debug)]
pub struct ScratchHandle {
    dir: PathBuf,
    path: PathBuf,
    storage: StorageClass,
    released: bool,
}

/// Create a scratch working copy.
///
/// `size_hint` is the expected plaintext size; volatile locations without
/// room for it are skipped. `extension` becomes the working file's
/// extension so editors pick the right mode.
///
/// # Errors
///
/// `ScratchUnavailable` when no candidate directory accepts the copy.
pub fn acquire(
    placement: &ScratchPlacement,
    mode: TmpfsMode,
    size_hint: u64,
    extension: Option<&str>,
) -> Result<ScratchHandle> {
    let mut failures = Vec::new();
    for (base, storage) in placement.candidates(mode, size_hint) {
        match create_in(&base, extension) {
            Ok((dir, path)) => {
                if storage == StorageClass::Persistent && mode == TmpfsMode::Prefer {
                    tracing::warn!(
                        dir = %base.display(),
                        "no memory-backed scratch location available; using persistent storage"
                    );
                }
                tracing::debug!(path = %path.display(), ?storage, "acquired scratch copy");
                return Ok(ScratchHandle {
                    dir,
                    path,
                    storage,
                    released: false,
                });
            }
            Err(err) => {
                tracing::debug!(dir = %base.display(), error = %err, "scratch candidate rejected");
                failures.push(format!("{}: {}", base.display(), err));
            }
        }
    }
    Err(NbiasError::ScratchUnavailable(failures.join("; ")))
}

fn create_in(base: &Path, extension: Option<&str>) -> Result<(PathBuf, PathBuf)> {
    let dir = base.join(format!("nbias-{}", random_token(16)?));
    create_private_dir(&dir).map_err(|e| NbiasError::io("create scratch dir", e))?;

    let name = match extension {
        Some(ext) => format!("{}.{}", WORKING_STEM, ext),
        None => WORKING_STEM.to_string(),
    };
    let path = dir.join(name);
    if let Err(err) = create_owner_only(&path) {
        let _ = fs::remove_dir(&dir);
        return Err(NbiasError::io("create scratch file", err));
    }
    Ok((dir, path))
}

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

impl ScratchHandle {
    /// Path handed to the editor.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Private directory holding the working copy.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn storage(&self) -> StorageClass {
        self.storage
    }

    /// Replace the working copy's content.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| NbiasError::io("open scratch file", e))?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(|e| NbiasError::io("write scratch file", e))
    }

    /// Read the working copy back.
    pub fn read(&self) -> Result<Zeroizing<Vec<u8>>> {
        fs::read(&self.path)
            .map(Zeroizing::new)
            .map_err(|e| NbiasError::io("read scratch file", e))
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let content = self.read()?;
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok();
        Ok(Fingerprint {
            modified,
            len: content.len() as u64,
            digest: *blake3::hash(&content).as_bytes(),
        })
    }

    /// Overwrite and remove everything in the private directory.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let result = wipe_tree(&self.dir).map_err(|e| NbiasError::io("erase scratch copy", e));
        match &result {
            Ok(()) => tracing::debug!(dir = %self.dir.display(), "scratch copy erased"),
            Err(err) => tracing::warn!(
                dir = %self.dir.display(),
                error = ?err.detail(),
                "scratch copy could not be fully erased"
            ),
        }
        result
    }
}

impl Drop for ScratchHandle {
    fn drop(&mut self) {
        let _ = self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn placement(configured: Option<PathBuf>, persistent: PathBuf) -> ScratchPlacement {
        ScratchPlacement {
            configured,
            detected: Vec::new(),
            persistent,
        }
    }

    #[test]
    fn test_never_uses_persistent_storage() {
        let volatile = tempdir().unwrap();
        let persistent = tempdir().unwrap();
        let placement = placement(
            Some(volatile.path().to_path_buf()),
            persistent.path().to_path_buf(),
        );

        let handle = acquire(&placement, TmpfsMode::Never, 10, Some("md")).unwrap();

        assert_eq!(handle.storage(), StorageClass::Persistent);
        assert!(handle.path().starts_with(persistent.path()));
        assert_eq!(handle.path().extension().unwrap(), "md");
    }

    #[test]
    fn test_prefer_uses_configured_volatile_dir() {
        let volatile = tempdir().unwrap();
        let persistent = tempdir().unwrap();
        let placement = placement(
            Some(volatile.path().to_path_buf()),
            persistent.path().to_path_buf(),
        );

        let handle = acquire(&placement, TmpfsMode::Prefer, 10, None).unwrap();

        assert_eq!(handle.storage(), StorageClass::Volatile);
        assert!(handle.path().starts_with(volatile.path()));
    }

    #[test]
    fn test_prefer_falls_back_when_volatile_missing() {
        let persistent = tempdir().unwrap();
        let placement = placement(
            Some(PathBuf::from("/no/such/volatile/dir")),
            persistent.path().to_path_buf(),
        );

        let handle = acquire(&placement, TmpfsMode::Prefer, 10, None).unwrap();

        assert_eq!(handle.storage(), StorageClass::Persistent);
        assert!(handle.path().starts_with(persistent.path()));
    }

    #[test]
    fn test_no_location_is_scratch_unavailable() {
        let placement = placement(None, PathBuf::from("/no/such/persistent/dir"));
        let err = acquire(&placement, TmpfsMode::Never, 0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScratchUnavailable);
    }

    #[test]
    fn test_paths_are_unpredictable() {
        let persistent = tempdir().unwrap();
        let placement = placement(None, persistent.path().to_path_buf());
        let a = acquire(&placement, TmpfsMode::Never, 0, None).unwrap();
        let b = acquire(&placement, TmpfsMode::Never, 0, None).unwrap();
        assert_ne!(a.dir(), b.dir());
        let name = a.dir().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name.len(), "nbias-".len() + 32);
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions_before_content() {
        use std::os::unix::fs::PermissionsExt;

        let persistent = tempdir().unwrap();
        let placement = placement(None, persistent.path().to_path_buf());
        let handle = acquire(&placement, TmpfsMode::Never, 0, None).unwrap();

        let file_mode = fs::metadata(handle.path()).unwrap().permissions().mode();
        let dir_mode = fs::metadata(handle.dir()).unwrap().permissions().mode();
        assert_eq!(fs::metadata(handle.path()).unwrap().len(), 0);
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_release_erases_copy_and_editor_artifacts() {
        let persistent = tempdir().unwrap();
        let placement = placement(None, persistent.path().to_path_buf());
        let handle = acquire(&placement, TmpfsMode::Never, 0, Some("txt")).unwrap();
        handle.write(b"PLAINTEXT").unwrap();
        fs::write(handle.dir().join(".note.txt.swp"), b"PLAINTEXT swap").unwrap();
        let dir = handle.dir().to_path_buf();
        let path = handle.path().to_path_buf();

        handle.release().unwrap();

        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_releases() {
        let persistent = tempdir().unwrap();
        let placement = placement(None, persistent.path().to_path_buf());
        let dir = {
            let handle = acquire(&placement, TmpfsMode::Never, 0, None).unwrap();
            handle.write(b"secret").unwrap();
            handle.dir().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn test_write_read_and_fingerprint() {
        let persistent = tempdir().unwrap();
        let placement = placement(None, persistent.path().to_path_buf());
        let handle = acquire(&placement, TmpfsMode::Never, 0, None).unwrap();

        handle.write(b"first").unwrap();
        let before = handle.fingerprint().unwrap();
        assert_eq!(handle.read().unwrap().as_slice(), b"first");

        handle.write(b"first").unwrap();
        assert!(!before.content_differs(&handle.fingerprint().unwrap()));

        handle.write(b"second").unwrap();
        assert!(before.content_differs(&handle.fingerprint().unwrap()));
    }

    #[test]
    fn test_tmpfs_mode_parse() {
        assert_eq!("prefer".parse::<TmpfsMode>(), Ok(TmpfsMode::Prefer));
        assert_eq!("never".parse::<TmpfsMode>(), Ok(TmpfsMode::Never));
        assert!("always".parse::<TmpfsMode>().is_err());
    }
}
