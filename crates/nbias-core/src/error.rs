//! Error types for nbias core operations.
//!
//! Every failure an edit session can hit maps onto one variant here. All of
//! them are terminal for the session; nothing is retried. The `Display`
//! output is the concise single-line message shown to the user, while
//! [`NbiasError::detail`] carries internal context (offsets, OS errors) that
//! the CLI only prints in verbose mode.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for nbias operations.
pub type Result<T> = std::result::Result<T, NbiasError>;

/// Core error type for nbias operations.
#[derive(Debug, Error)]
pub enum NbiasError {
    /// Passphrase or hex key is unusable (empty, wrong length, bad digits,
    /// or the wrong kind of secret for the container).
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// Target rejected by the extension allow-list or size limit.
    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    /// No location could host the scratch working copy.
    #[error("scratch space unavailable")]
    ScratchUnavailable(String),

    /// Container bytes do not follow the vault layout.
    #[error("malformed vault container")]
    MalformedContainer(String),

    /// Container declares a format version this build does not know.
    #[error("unsupported vault version {0}")]
    UnsupportedVersion(u8),

    /// Tag verification failed. Deliberately carries no detail: a wrong
    /// secret and tampered bytes must look identical.
    #[error("authentication failed: wrong secret or damaged vault")]
    AuthenticationFailed,

    /// The external editor could not be launched or exited unsuccessfully.
    #[error("editor failed: {0}")]
    EditorFailed(String),

    /// Filesystem failure.
    #[error("I/O failure")]
    IoFailure(String),

    /// The process received a termination signal mid-session.
    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    /// Cipher or KDF construction failure.
    #[error("cryptographic failure")]
    Crypto(String),
}

/// Stable, copyable classification of [`NbiasError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSecret,
    PolicyRejected,
    ScratchUnavailable,
    MalformedContainer,
    UnsupportedVersion,
    AuthenticationFailed,
    EditorFailed,
    IoFailure,
    Interrupted,
    Crypto,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidSecret => "invalid_secret",
            ErrorKind::PolicyRejected => "policy_rejected",
            ErrorKind::ScratchUnavailable => "scratch_unavailable",
            ErrorKind::MalformedContainer => "malformed_container",
            ErrorKind::UnsupportedVersion => "unsupported_version",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::EditorFailed => "editor_failed",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::Crypto => "crypto",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NbiasError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NbiasError::InvalidSecret(_) => ErrorKind::InvalidSecret,
            NbiasError::PolicyRejected(_) => ErrorKind::PolicyRejected,
            NbiasError::ScratchUnavailable(_) => ErrorKind::ScratchUnavailable,
            NbiasError::MalformedContainer(_) => ErrorKind::MalformedContainer,
            NbiasError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            NbiasError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            NbiasError::EditorFailed(_) => ErrorKind::EditorFailed,
            NbiasError::IoFailure(_) => ErrorKind::IoFailure,
            NbiasError::Interrupted(_) => ErrorKind::Interrupted,
            NbiasError::Crypto(_) => ErrorKind::Crypto,
        }
    }

    /// Internal detail that is hidden from the default one-line message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            NbiasError::ScratchUnavailable(detail)
            | NbiasError::MalformedContainer(detail)
            | NbiasError::IoFailure(detail)
            | NbiasError::Crypto(detail) => Some(detail.as_str()),
            _ => None,
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        NbiasError::MalformedContainer(detail.into())
    }

    /// An `IoFailure` that names the operation that failed.
    pub fn io(context: &str, err: std::io::Error) -> Self {
        NbiasError::IoFailure(format!("{}: {}", context, err))
    }
}

impl From<std::io::Error> for NbiasError {
    fn from(err: std::io::Error) -> Self {
        NbiasError::IoFailure(err.to_string())
    }
}
