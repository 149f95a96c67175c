//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_LEVEL;

/// Install a formatted `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `level` (typically
/// [`EdgarConfig::log_level`](crate::config::EdgarConfig::log_level)) is used,
/// falling back to `info` when it is not a valid filter directive.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes. Stdout is left alone so it stays free for protocol
/// output.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
