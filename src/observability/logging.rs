use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CleanupError, Result};

/// Installs the global subscriber: human-readable lines on stderr and
/// daily-rotated JSON under `config.directory`.
///
/// The returned guard owns the file writer's worker. Hold it until the
/// process exits; dropping it flushes the remaining buffered lines.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.directory).map_err(|e| {
        CleanupError::Config(format!("Failed to create log directory '{}': {}", config.directory, e))
    })?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(file_writer);

    // stdout carries the report itself
    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &config.default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| CleanupError::Config(format!("Failed to install log subscriber: {}", e)))?;

    Ok(guard)
}

/// `RUST_LOG` wins when present; the configured directives are the fallback.
fn env_filter(from_env: Option<String>, default_filter: &str) -> Result<EnvFilter> {
    let directives = from_env
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| default_filter.to_string());
    EnvFilter::try_new(&directives)
        .map_err(|e| CleanupError::Config(format!("Invalid log filter '{}': {}", directives, e)))
}
