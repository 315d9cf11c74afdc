//! Extension and size policy, and source-disposal modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NbiasError, Result};

/// Limits a document must satisfy before it is decrypted or resealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// Allowed document extensions. `None` or an empty list allows any.
    pub allow_extensions: Option<Vec<String>>,
    /// Largest accepted document, in bytes.
    pub max_bytes: Option<u64>,
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl Policy {
    /// Parse a comma separated allow-list such as `md,txt`.
    pub fn parse_allow_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(normalize)
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    pub fn check_extension(&self, extension: Option<&str>) -> Result<()> {
        let allowed = match self.allow_extensions.as_deref() {
            Some(list) if !list.is_empty() => list,
            _ => return Ok(()),
        };
        let Some(extension) = extension else {
            return Err(NbiasError::PolicyRejected(
                "document has no extension and an allow-list is configured".to_string(),
            ));
        };
        let wanted = normalize(extension);
        if allowed.iter().any(|ext| normalize(ext) == wanted) {
            Ok(())
        } else {
            Err(NbiasError::PolicyRejected(format!(
                "extension {:?} is not allowed (allowed: {})",
                extension,
                allowed.join(", ")
            )))
        }
    }

    pub fn check_size(&self, size: u64) -> Result<()> {
        match self.max_bytes {
            Some(limit) if size > limit => Err(NbiasError::PolicyRejected(format!(
                "document is {} bytes, limit is {}",
                size, limit
            ))),
            _ => Ok(()),
        }
    }
}

/// What happens to a plaintext source once its vault is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteSourceMode {
    #[default]
    Ask,
    Yes,
    No,
}

impl DeleteSourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeleteSourceMode::Ask => "ask",
            DeleteSourceMode::Yes => "yes",
            DeleteSourceMode::No => "no",
        }
    }
}

impl fmt::Display for DeleteSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeleteSourceMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "ask" => Ok(DeleteSourceMode::Ask),
            "yes" => Ok(DeleteSourceMode::Yes),
            "no" => Ok(DeleteSourceMode::No),
            other => Err(format!("invalid delete-source mode: {} (use ask, yes or no)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_no_policy_allows_everything() {
        let policy = Policy::default();
        assert!(policy.check_extension(None).is_ok());
        assert!(policy.check_extension(Some("exe")).is_ok());
        assert!(policy.check_size(u64::MAX).is_ok());
    }

    #[test]
    fn test_allow_list_is_case_and_dot_insensitive() {
        let policy = Policy {
            allow_extensions: Some(Policy::parse_allow_list(".MD, txt")),
            max_bytes: None,
        };
        assert!(policy.check_extension(Some("md")).is_ok());
        assert!(policy.check_extension(Some("TXT")).is_ok());

        let err = policy.check_extension(Some("pdf")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyRejected);
        assert!(policy.check_extension(None).is_err());
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let policy = Policy {
            allow_extensions: Some(Policy::parse_allow_list(" , ")),
            max_bytes: None,
        };
        assert!(policy.check_extension(Some("anything")).is_ok());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = Policy {
            allow_extensions: None,
            max_bytes: Some(10),
        };
        assert!(policy.check_size(10).is_ok());
        assert_eq!(
            policy.check_size(11).unwrap_err().kind(),
            ErrorKind::PolicyRejected
        );
    }

    #[test]
    fn test_delete_source_mode_parse() {
        assert_eq!("ask".parse::<DeleteSourceMode>(), Ok(DeleteSourceMode::Ask));
        assert_eq!("yes".parse::<DeleteSourceMode>(), Ok(DeleteSourceMode::Yes));
        assert_eq!("no".parse::<DeleteSourceMode>(), Ok(DeleteSourceMode::No));
        assert!("maybe".parse::<DeleteSourceMode>().is_err());
        assert_eq!(DeleteSourceMode::default(), DeleteSourceMode::Ask);
    }
}
