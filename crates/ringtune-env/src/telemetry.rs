//! Tracing subscriber setup for the tuning tools.

use tracing_subscriber::EnvFilter;

/// Install a compact stdout subscriber. The level is taken from
/// `RUST_LOG` and falls back to `info`. Safe to call more than once;
/// later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}
