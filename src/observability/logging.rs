//! # Structured Logging
//!
//! Subscriber setup for the `tracing` ecosystem. Every event carries the
//! source file and line, and runs inside a root span holding the environment
//! name so that each line can be traced back to a deployment.

use crate::config::LoggingConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over [`LoggingConfig::log_level`] when set. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry
            .with(fmt::layer().json().with_file(true).with_line_number(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_file(true).with_line_number(true)).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))
}

/// Root span carrying the environment name. Enter it for the life of the process.
pub fn root_span(env: &str) -> tracing::Span {
    tracing::info_span!("sfk", env = %env)
}

/// Log the non-secret parts of the secret store configuration.
pub fn log_config_info(config: &crate::config::SecretStoreConfig) {
    tracing::info!(
        token_url = %config.token_url,
        api_base_url = %config.api_base_url,
        token_ttl_seconds = config.token_ttl_seconds,
        secret_ttl_seconds = config.secret_ttl_seconds,
        secret_cache_capacity = config.secret_cache_capacity,
        "Secret store configuration loaded"
    );
}
