//! Application context for the nbias CLI.

mod context;

pub use context::AppContext;
