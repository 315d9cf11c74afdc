//! The edit session state machine.
//!
//! ```text
//! Idle -> Validating -> Decrypting -> Editing -> Resealing -> Disposing -> Done
//!            \______________\______________\__________\____________\----> Failed(kind)
//! ```
//!
//! The scratch handle and the key material are locals of [`EditSession::run`],
//! so whichever way the run ends they are dropped: the working copy is
//! overwritten and removed, and the key bytes are zeroized. A signal that
//! arrives mid-session is noticed at the next transition and turns into
//! `Failed(Interrupted)` through the same path.

mod collaborator;
mod policy;

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::KdfProfile;
use crate::error::{ErrorKind, NbiasError, Result};
use crate::interrupt;
use crate::scratch::{self, ScratchPlacement, StorageClass, TmpfsMode};
use crate::transfer::{extension_of, new_key, write_verified};
use crate::vault::{inspect, unseal, Metadata, DEFAULT_VAULT_EXTENSION};

pub use collaborator::{Confirmer, EditorCollaborator, EditorExit, SecretProvider, SecretPurpose};
pub use policy::{DeleteSourceMode, Policy};

/// Everything an edit session needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// A vault file, or a plaintext file to bring under encryption.
    pub target: PathBuf,
    /// Extension that marks a file as a vault.
    pub vault_extension: String,
    /// Document extension recorded when a new vault is created.
    pub orig_extension: Option<String>,
    /// Profile for new vaults. Existing vaults keep their own.
    pub requested_profile: Option<KdfProfile>,
    pub policy: Policy,
    pub delete_source: DeleteSourceMode,
    /// Treat `ask` as confirmed.
    pub assume_yes: bool,
    pub placement: ScratchPlacement,
    pub tmpfs: TmpfsMode,
}

impl EditRequest {
    /// A request with default settings for `target`.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            vault_extension: DEFAULT_VAULT_EXTENSION.to_string(),
            orig_extension: None,
            requested_profile: None,
            policy: Policy::default(),
            delete_source: DeleteSourceMode::default(),
            assume_yes: false,
            placement: ScratchPlacement::detect(None),
            tmpfs: TmpfsMode::default(),
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Validating,
    Decrypting,
    Editing,
    Resealing,
    Disposing,
    Done,
    Failed(ErrorKind),
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Validating => f.write_str("validating"),
            SessionState::Decrypting => f.write_str("decrypting"),
            SessionState::Editing => f.write_str("editing"),
            SessionState::Resealing => f.write_str("resealing"),
            SessionState::Disposing => f.write_str("disposing"),
            SessionState::Done => f.write_str("done"),
            SessionState::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

/// What happened to the plaintext source of a first-time vaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDisposition {
    /// The session edited an existing or new vault.
    NotApplicable,
    Deleted,
    Kept,
}

/// Result of a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub vault_path: PathBuf,
    /// The vault did not exist before this session.
    pub created: bool,
    pub content_changed: bool,
    pub source_disposition: SourceDisposition,
    pub storage: StorageClass,
    pub trace: Vec<SessionState>,
}

enum Target {
    Vault {
        path: PathBuf,
        existing: Option<Vec<u8>>,
    },
    Source {
        /// The path as given; a symlink here is removed along with its target.
        source: PathBuf,
        /// Where the plaintext bytes actually live.
        real: PathBuf,
        vault: PathBuf,
    },
}

impl Target {
    fn vault_path(&self) -> &Path {
        match self {
            Target::Vault { path, .. } => path,
            Target::Source { vault, .. } => vault,
        }
    }
}

/// One edit of one document.
#[derive(Debug)]
pub struct EditSession<'r> {
    request: &'r EditRequest,
    trace: Vec<SessionState>,
}

impl<'r> EditSession<'r> {
    pub fn new(request: &'r EditRequest) -> Self {
        Self {
            request,
            trace: vec![SessionState::Idle],
        }
    }

    pub fn state(&self) -> SessionState {
        self.trace
            .last()
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn trace(&self) -> &[SessionState] {
        &self.trace
    }

    /// Drive the session to `Done` or `Failed`.
    pub fn run(
        &mut self,
        secrets: &mut dyn SecretProvider,
        editor: &mut dyn EditorCollaborator,
        confirmer: &mut dyn Confirmer,
    ) -> Result<SessionOutcome> {
        if self.state() != SessionState::Idle {
            return Err(NbiasError::IoFailure(format!(
                "session already ran (state {})",
                self.state()
            )));
        }

        // Scratch and key material are dropped inside `drive`, before the
        // terminal state is recorded.
        let result = self.drive(secrets, editor, confirmer);
        match result {
            Ok(mut outcome) => {
                self.transition(SessionState::Done);
                outcome.trace = self.trace.clone();
                tracing::info!(
                    vault = %outcome.vault_path.display(),
                    changed = outcome.content_changed,
                    "edit session complete"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.transition(SessionState::Failed(err.kind()));
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state(), to = %next, "session transition");
        self.trace.push(next);
    }

    fn enter(&mut self, next: SessionState) -> Result<()> {
        interrupt::check()?;
        self.transition(next);
        Ok(())
    }

    fn drive(
        &mut self,
        secrets: &mut dyn SecretProvider,
        editor: &mut dyn EditorCollaborator,
        confirmer: &mut dyn Confirmer,
    ) -> Result<SessionOutcome> {
        let request = self.request;

        self.enter(SessionState::Validating)?;
        let target = classify(request)?;
        let (extension, size) = match &target {
            Target::Vault {
                existing: Some(bytes),
                ..
            } => {
                let summary = inspect(bytes)?;
                (summary.original_extension, summary.ciphertext_length)
            }
            Target::Vault { existing: None, .. } => (request.orig_extension.clone(), 0),
            Target::Source { source, real, .. } => {
                let len = fs::metadata(real)
                    .map_err(|e| NbiasError::io("stat source", e))?
                    .len();
                let extension = request
                    .orig_extension
                    .clone()
                    .or_else(|| extension_of(source));
                (extension, len)
            }
        };
        request.policy.check_extension(extension.as_deref())?;
        request.policy.check_size(size)?;
        let new_metadata = match extension.as_deref() {
            Some(ext) => Metadata::with_extension(ext)?,
            None => Metadata::default(),
        };

        // Before any key is derived.
        let scratch = scratch::acquire(
            &request.placement,
            request.tmpfs,
            size,
            new_metadata.original_extension.as_deref(),
        )?;

        self.enter(SessionState::Decrypting)?;
        let (plaintext, key, metadata) = match &target {
            Target::Vault {
                existing: Some(bytes),
                ..
            } => {
                let secret = secrets.provide(SecretPurpose::Open)?;
                let (decoded, key) = unseal(bytes, &secret)?;
                if let Some(requested) = request.requested_profile {
                    if key.params().profile != Some(requested) {
                        tracing::warn!(
                            requested = %requested,
                            stored = ?key.params().profile,
                            "keeping the vault's stored KDF profile"
                        );
                    }
                }
                (decoded.plaintext, key, decoded.metadata)
            }
            Target::Vault { existing: None, .. } => {
                let secret = secrets.provide(SecretPurpose::Create)?;
                let key = new_key(&secret, request.requested_profile.unwrap_or_default())?;
                (Zeroizing::new(Vec::new()), key, new_metadata)
            }
            Target::Source { real, .. } => {
                let plaintext = Zeroizing::new(
                    fs::read(real).map_err(|e| NbiasError::io("read source", e))?,
                );
                let secret = secrets.provide(SecretPurpose::Create)?;
                let key = new_key(&secret, request.requested_profile.unwrap_or_default())?;
                (plaintext, key, new_metadata)
            }
        };

        self.enter(SessionState::Editing)?;
        scratch.write(&plaintext)?;
        drop(plaintext);
        let before = scratch.fingerprint()?;
        let exit = editor.edit(scratch.path())?;
        interrupt::check()?;

        if let EditorExit::Failed(code) = exit {
            // Changes are discarded; nothing is resealed.
            self.enter(SessionState::Disposing)?;
            scratch.release()?;
            let status = code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c));
            return Err(NbiasError::EditorFailed(format!(
                "editor exited with {}; changes discarded",
                status
            )));
        }

        let after = scratch.fingerprint()?;
        let content_changed = before.content_differs(&after);
        if !content_changed && before.modified != after.modified {
            tracing::debug!("working copy touched but content unchanged");
        }

        self.enter(SessionState::Resealing)?;
        let edited = scratch.read()?;
        request.policy.check_size(edited.len() as u64)?;
        let vault_path = target.vault_path().to_path_buf();
        write_verified(&vault_path, &edited, &key, &metadata)?;
        drop(edited);
        drop(key);

        self.enter(SessionState::Disposing)?;
        let storage = scratch.storage();
        scratch.release()?;

        let (created, source_disposition) = match &target {
            Target::Vault { existing, .. } => (existing.is_none(), SourceDisposition::NotApplicable),
            Target::Source { source, real, .. } => {
                let disposition = dispose_source(request, source, real, &vault_path, confirmer)?;
                (true, disposition)
            }
        };

        Ok(SessionOutcome {
            vault_path,
            created,
            content_changed,
            source_disposition,
            storage,
            trace: Vec::new(),
        })
    }
}

fn classify(request: &EditRequest) -> Result<Target> {
    let target = &request.target;
    let vault_ext = request.vault_extension.trim_start_matches('.');
    let is_vault = target
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(vault_ext))
        .unwrap_or(false);

    if is_vault {
        let existing = match fs::read(target) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(NbiasError::io("read vault", err)),
        };
        return Ok(Target::Vault {
            path: target.clone(),
            existing,
        });
    }

    let link = fs::symlink_metadata(target).map_err(|e| NbiasError::io("open source", e))?;
    let real = if link.file_type().is_symlink() {
        fs::canonicalize(target).map_err(|e| NbiasError::io("resolve source link", e))?
    } else {
        target.clone()
    };
    let meta = fs::metadata(&real).map_err(|e| NbiasError::io("open source", e))?;
    if !meta.is_file() {
        return Err(NbiasError::IoFailure(format!(
            "{} is not a regular file",
            target.display()
        )));
    }
    let mut vault: OsString = target.as_os_str().to_owned();
    vault.push(".");
    vault.push(vault_ext);
    let vault = PathBuf::from(vault);
    if vault.exists() {
        return Err(NbiasError::PolicyRejected(format!(
            "{} already exists; edit it directly",
            vault.display()
        )));
    }
    Ok(Target::Source {
        source: target.clone(),
        real,
        vault,
    })
}

fn dispose_source(
    request: &EditRequest,
    source: &Path,
    real: &Path,
    vault: &Path,
    confirmer: &mut dyn Confirmer,
) -> Result<SourceDisposition> {
    let delete = match request.delete_source {
        DeleteSourceMode::No => false,
        DeleteSourceMode::Yes => true,
        DeleteSourceMode::Ask if request.assume_yes => true,
        DeleteSourceMode::Ask => confirmer.confirm(&format!(
            "Vault written to {}. Securely delete plaintext {}?",
            vault.display(),
            source.display()
        ))?,
    };
    if !delete {
        tracing::debug!(source = %source.display(), "plaintext source kept");
        return Ok(SourceDisposition::Kept);
    }
    scratch::wipe_file(real).map_err(|e| NbiasError::io("delete source", e))?;
    if real != source {
        scratch::wipe_file(source).map_err(|e| NbiasError::io("remove source link", e))?;
    }
    tracing::info!(source = %source.display(), "plaintext source erased");
    Ok(SourceDisposition::Deleted)
}
