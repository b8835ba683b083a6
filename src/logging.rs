//! Logging setup
//!
//! The library only emits `tracing` events. Applications that want them
//! printed call [`init`] once at startup.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails with
/// `Error::Config` if the level is not a valid filter or a global subscriber
/// is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set subscriber: {}", e)))
}
