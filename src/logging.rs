//! Log subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for RPC responses.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber with `filter` (e.g. `info`).
///
/// An invalid filter falls back to `info`. Calling this twice is a no-op.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
