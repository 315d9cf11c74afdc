//! Seams between the session and the outside world.

use std::path::Path;

use crate::crypto::Secret;
use crate::error::Result;

/// How the external editor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorExit {
    Success,
    /// Non-zero exit, or killed by a signal when there is no code.
    Failed(Option<i32>),
}

/// Opens the working copy for the user and blocks until they are done.
pub trait EditorCollaborator {
    fn edit(&mut self, path: &Path) -> Result<EditorExit>;
}

/// Yes/no question for the user.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Why the session needs a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPurpose {
    /// Unlock an existing container.
    Open,
    /// Seal a new container; prompts should ask twice.
    Create,
}

/// Supplies the secret once the session knows it will need one.
///
/// Called only after policy checks pass and scratch space is acquired.
pub trait SecretProvider {
    fn provide(&mut self, purpose: SecretPurpose) -> Result<Secret>;
}

impl<F> SecretProvider for F
where
    F: FnMut(SecretPurpose) -> Result<Secret>,
{
    fn provide(&mut self, purpose: SecretPurpose) -> Result<Secret> {
        self(purpose)
    }
}
