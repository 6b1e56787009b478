//! Tracing subscriber setup for the binaries.
//!
//! Logs go to stderr so the JSON-RPC channel on stdout stays clean. `RUST_LOG`
//! overrides the configured filter.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Returns `false` if one was already installed.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
