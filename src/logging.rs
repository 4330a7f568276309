//! Logging for deployment programs.
//!
//! The SDK logs through `tracing`. Programs that want to see those logs can install a subscriber
//! with [`init_logging`], which honours `RUST_LOG` and writes to stderr (stdout is reserved for the
//! engine).

use tracing_subscriber::EnvFilter;

/// The filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "awstags=info";

/// Install a global subscriber, ignoring failure if one is already installed.
pub fn init_logging() {
    let _ = try_init_logging(DEFAULT_FILTER);
}

/// Install a global subscriber that uses `default_filter` when `RUST_LOG` is not set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn try_init_logging(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
