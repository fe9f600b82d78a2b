//! Diagnostic logging setup.
//!
//! Events go to stderr so `--format json` output on stdout stays parseable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SPECMCP_LOG";

/// Initialize the global subscriber. `SPECMCP_LOG` wins over `verbose`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "specmcp=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
