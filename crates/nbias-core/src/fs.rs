//! Filesystem utilities for atomic, owner-only writes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{NbiasError, Result};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to `path` through a sibling temp file and a rename.
///
/// The temp file is created exclusively with owner-only permissions and
/// synced before the rename, so a crash leaves either the previous file or
/// the complete new one, never a torn write.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = sibling_temp_path(path)?;

    let mut file = create_owner_only(&temp_path)
        .map_err(|e| NbiasError::io("temp file create failed", e))?;
    let written = file
        .write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| NbiasError::io("temp file write failed", e));
    if let Err(err) = written {
        drop(file);
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    drop(file);

    rename_with_fallback(&temp_path, path).map_err(|e| NbiasError::io("atomic rename failed", e))?;
    sync_parent_dir(path);
    Ok(())
}

/// Create a new file that only the owner can read or write.
///
/// Fails if the path already exists.
pub fn create_owner_only(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Random lowercase hex token drawn from the OS RNG.
pub fn random_token(bytes: usize) -> Result<String> {
    let mut buf = vec![0u8; bytes];
    getrandom::getrandom(&mut buf)
        .map_err(|e| NbiasError::Crypto(format!("random source failed: {}", e)))?;
    Ok(hex::encode(buf))
}

fn sibling_temp_path(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| NbiasError::IoFailure(format!("invalid filename: {}", path.display())))?;
    Ok(parent.join(format!(".{}.{}.tmp", filename, random_token(8)?)))
}

fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}
