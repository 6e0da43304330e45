//! Shared tracing setup for the client process.

/// Tracing configuration (filter, formatting).
pub mod tracing;

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
