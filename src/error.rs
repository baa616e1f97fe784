//! Error types for agent-gateway.

use std::process::ExitStatus;

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The external program could not be started (missing binary,
    /// permission denied, ...).
    #[error("failed to start {program}: {source}")]
    StartFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("command failed ({status}):\n{output}")]
    ExecutionFailure { status: String, output: String },

    /// A tunnel with this identifier is already registered.
    #[error("server {0} is already being shared")]
    DuplicateTunnel(String),

    /// Readiness was not observed before the deadline.
    #[error("timed out waiting for share URL for {id}. Output so far:\n{output}")]
    MonitorTimeout { id: String, output: String },

    /// The tunnel process exited before reporting readiness.
    #[error("share process for {id} exited unexpectedly. Output:\n{output}")]
    MonitorProcessExit { id: String, output: String },

    /// No tunnel is registered under this identifier.
    #[error("server {0} is not currently shared")]
    TunnelNotFound(String),

    /// Malformed request from the upstream caller.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl GatewayError {
    pub(crate) fn start_failure(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::StartFailure {
            program: program.into(),
            source,
        }
    }

    pub(crate) fn execution_failure(status: ExitStatus, output: impl Into<String>) -> Self {
        Self::ExecutionFailure {
            status: status.to_string(),
            output: output.into(),
        }
    }

    /// Whether the caller may simply try the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MonitorTimeout { .. })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StartFailure { .. } => "START_FAILURE",
            Self::ExecutionFailure { .. } => "EXECUTION_FAILURE",
            Self::DuplicateTunnel(_) => "DUPLICATE_TUNNEL",
            Self::MonitorTimeout { .. } => "MONITOR_TIMEOUT",
            Self::MonitorProcessExit { .. } => "MONITOR_PROCESS_EXIT",
            Self::TunnelNotFound(_) => "TUNNEL_NOT_FOUND",
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::Io(_) | Self::LockPoisoned => "INTERNAL_ERROR",
        }
    }
}

/// Convenience Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
