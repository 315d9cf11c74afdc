//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::constants::ENV_LOG;

/// Install the stderr subscriber.
///
/// `NBIAS_LOG` wins when it parses; otherwise `--verbose` selects `debug`
/// and the default is `warn`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = std::env::var(ENV_LOG)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
