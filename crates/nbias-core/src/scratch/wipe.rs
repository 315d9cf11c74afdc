//! Overwrite-then-unlink erasure.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const WIPE_CHUNK: usize = 64 * 1024;

/// Overwrite the full current length of the file at `path` with zeros and
/// flush it to storage. Returns the number of bytes overwritten.
///
/// Symlinks are never followed.
pub fn overwrite(path: &Path) -> io::Result<u64> {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW);
    }
    let mut file = options.open(path)?;
    let len = file.metadata()?.len();

    let zeros = vec![0u8; WIPE_CHUNK];
    let mut remaining = len;
    while remaining > 0 {
        let step = remaining.min(WIPE_CHUNK as u64) as usize;
        file.write_all(&zeros[..step])?;
        remaining -= step as u64;
    }
    file.sync_all()?;
    Ok(len)
}

/// Overwrite and then remove a file. A file that is already gone counts as
/// wiped.
pub fn wipe_file(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
        Ok(meta) if meta.file_type().is_file() => {
            overwrite(path)?;
        }
        Ok(_) => {}
    }
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Wipe every regular file below `dir`, then remove the directory tree.
///
/// Keeps going after a failure so one stubborn file does not leave the rest
/// behind; the first error is returned.
pub fn wipe_tree(dir: &Path) -> io::Result<()> {
    let mut first_error: Option<io::Error> = None;
    let mut note = |result: io::Result<()>| {
        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    };

    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        note(Err(err));
                        continue;
                    }
                };
                let path = entry.path();
                match entry.file_type() {
                    Ok(kind) if kind.is_dir() => note(wipe_tree(&path)),
                    Ok(_) => note(wipe_file(&path)),
                    Err(err) => note(Err(err)),
                }
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => note(Err(err)),
    }

    match fs::remove_dir(dir) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        other => note(other),
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
