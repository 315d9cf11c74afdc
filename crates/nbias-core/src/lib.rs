//! nbias core library.
//!
//! Edits notes that only ever rest on disk in encrypted form. This crate
//! holds everything below the command line:
//!
//! - [`crypto`]: Argon2id key derivation and secret handling
//! - [`vault`]: the XChaCha20-Poly1305 container format
//! - [`scratch`]: private working copies, preferably on tmpfs, erased on release
//! - [`session`]: the edit state machine and its collaborator traits
//! - [`transfer`]: one-shot encrypt and decrypt
//!
//! Terminal I/O, editor processes and prompts live in the CLI crate and are
//! plugged in through the traits in [`session`].

pub mod crypto;
pub mod error;
pub mod fs;
pub mod interrupt;
pub mod scratch;
pub mod session;
pub mod transfer;
pub mod vault;

pub use crypto::{KdfProfile, Secret};
pub use error::{ErrorKind, NbiasError, Result};
pub use interrupt::InterruptGuard;
pub use scratch::{ScratchPlacement, TmpfsMode};
pub use session::{
    Confirmer, DeleteSourceMode, EditRequest, EditSession, EditorCollaborator, EditorExit, Policy,
    SecretProvider, SecretPurpose, SessionOutcome, SessionState, SourceDisposition,
};
pub use vault::{inspect, HeaderSummary, DEFAULT_VAULT_EXTENSION};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
