//! Logging setup for binaries and tests embedding the merge engine.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the caller's job.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with the default `info` filter.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format suitable for terminal output
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
///
/// Returns quietly if a global subscriber is already installed, so test
/// binaries can call it from every test.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_test_writer())
        .try_init();
}

/// Log prefixes for merge phases.
pub mod prefix {
    /// Merge lifecycle (start, finish)
    pub const MERGE: &str = "⋈";
    /// Local worker pool
    pub const POOL: &str = "⫶";
    /// External cluster tasks
    pub const CLUSTER: &str = "☍";
}
