//! Constants used throughout the CLI.

/// Environment variable holding a passphrase.
pub const ENV_PASSPHRASE: &str = "NBIAS_PASSPHRASE";

/// Environment variable holding a 64-digit hex key.
pub const ENV_KEY_HEX: &str = "NBIAS_KEY_HEX";

/// Environment variable pointing at a config file.
pub const ENV_CONFIG: &str = "NBIAS_CONFIG";

/// Environment variable holding a tracing filter directive.
pub const ENV_LOG: &str = "NBIAS_LOG";

/// Exit codes for the CLI.
///
/// Every failure, usage errors included, exits with `FAILURE`.
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}
