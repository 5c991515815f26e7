//! Diagnostic logging setup for the `cargo2bp` binary.
//!
//! User-facing progress goes to stdout with `colored`; these `tracing`
//! events go to stderr and are filtered by `RUST_LOG`.

use std::io;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `verbose` raises the default level to debug.
pub fn init(verbose: bool) {
    let default = if verbose { "cargo2bp=debug" } else { "cargo2bp=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .with_filter(filter);

    // a subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
