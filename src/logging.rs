//! Process-wide tracing subscriber setup

use corral_core::config::{LogFormat, LoggingConfig};
use corral_core::error::{CorralError, CorralResult};
use tracing_subscriber::EnvFilter;

/// Install a global tracing subscriber for `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`.
/// Fails if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> CorralResult<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => parse_filter(&directives)?,
        _ => parse_filter(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| CorralError::other(format!("Failed to install log subscriber: {}", e)))?;

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

fn parse_filter(directives: &str) -> CorralResult<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        CorralError::config_with_context(
            format!("Invalid log filter '{}': {}", directives, e),
            "Initializing logging",
        )
    })
}
