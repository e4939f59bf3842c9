//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_filter(config: &LoggingConfig) -> crate::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level)
        .map_err(|e| crate::Error::Config(format!("Invalid log filter '{}': {}", config.level, e)))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> crate::Result<()> {
    let filter = build_filter(config)?;

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .try_init(),
        "text" => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .try_init(),
        other => {
            return Err(crate::Error::Config(format!(
                "Unknown log format '{}', expected \"json\" or \"text\"",
                other
            )))
        }
    };

    result.map_err(|e| crate::Error::Config(format!("Failed to install subscriber: {}", e)))
}
