//! `tracing` subscriber setup
//!
//! ```rust,ignore
//! let config = trellis::Config::init(Path::new("."));
//! trellis::logging::init(&config.app);
//! ```

use crate::config::AppConfig;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
///
/// An unparsable `log_level` falls back to `info`.
pub fn filter_for(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a compact fmt subscriber; fails if one is already installed
pub fn try_init(config: &AppConfig) -> Result<(), TryInitError> {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(fmt::layer().compact().with_target(config.debug))
        .try_init()
}

/// Install the subscriber, ignoring an already installed one
pub fn init(config: &AppConfig) {
    let _ = try_init(config);
}
