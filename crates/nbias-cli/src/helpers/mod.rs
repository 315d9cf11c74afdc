//! Helper functions for the CLI.

mod input;

pub use input::{CliSecrets, PromptConfirmer};
