//! Output formatting helpers for the CLI.

mod json;
mod text;

pub use json::summary_json;
pub use text::{outcome_lines, summary_lines};
