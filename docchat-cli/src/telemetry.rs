//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Install a global subscriber writing to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Stdout is reserved for answers and JSON output.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in another binary.
    let _ = if json { builder.json().try_init() } else { builder.try_init() };
}
