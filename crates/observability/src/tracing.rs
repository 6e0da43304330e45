//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the client process.
///
/// Compact human-readable lines on stderr, filterable via `RUST_LOG`.
/// Session and backend events log under the `bombeiro_*` targets, so
/// `RUST_LOG=bombeiro_session=debug` surfaces the auth state machine.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}
