//! Logging initialization and configuration.
//!
//! Events go to stderr and, when a log file is configured, to an
//! append-only plain-text file as well. Every command execution and
//! tunnel lifecycle transition emits one event.

use std::path::Path;

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "agent_gateway=info";

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be created or opened.
    #[error("failed to open log file: {0}")]
    File(#[from] InitError),

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Build the event filter from a level name ("debug") or full directives
/// ("agent_gateway=debug,tower_http=info").
pub fn filter_for(level: &str) -> EnvFilter {
    let directives = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("agent_gateway={}", level)
    };
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `path` for appending, creating it and its directory if needed.
pub fn file_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "agent-gateway.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}

/// Initialize logging with the given level and optional log file.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let file_layer = match log_file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender(path)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Try to initialize stderr logging with the default filter.
///
/// Uses `RUST_LOG` when set. Returns `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
}
