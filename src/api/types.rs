//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::execution::CommandResult;
use crate::tunnel::{TunnelInfo, TunnelStarted};

/// Request to share a tool server through a tunnel.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareRequest {
    /// Server name; also the tunnel identifier.
    pub name: String,
    /// Local port to expose.
    #[serde(default)]
    pub port: Option<u16>,
    /// Disable authentication on the public endpoint.
    #[serde(default)]
    pub no_auth: bool,
}

/// Response for a tunnel that became ready.
#[derive(Debug, Clone, Serialize)]
pub struct ShareResponse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Output captured while starting.
    pub output: String,
}

impl From<TunnelStarted> for ShareResponse {
    fn from(started: TunnelStarted) -> Self {
        Self {
            name: started.id,
            url: started.url,
            output: started.output,
        }
    }
}

/// Response for a stopped tunnel.
#[derive(Debug, Clone, Serialize)]
pub struct StopResponse {
    pub name: String,
    pub message: String,
}

impl StopResponse {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("Stopped sharing server {}", name),
            name,
        }
    }
}

/// List tunnels response.
#[derive(Debug, Clone, Serialize)]
pub struct ListTunnelsResponse {
    /// Total number of tunnels.
    pub count: usize,
    /// Tunnel summaries, sorted by name.
    pub tunnels: Vec<TunnelSummary>,
    /// Human-readable rendering of the list.
    pub summary: String,
}

/// Brief tunnel summary for listing.
#[derive(Debug, Clone, Serialize)]
pub struct TunnelSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// `false` while the process is still being spawned.
    pub active: bool,
    pub uptime_seconds: f64,
}

impl From<TunnelInfo> for TunnelSummary {
    fn from(info: TunnelInfo) -> Self {
        Self {
            name: info.id,
            pid: info.pid,
            active: info.active,
            uptime_seconds: info.age.as_secs_f64(),
        }
    }
}

/// Response for command execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteCommandResponse {
    /// Whether the program exited with status zero.
    pub success: bool,
    /// Exit code (if process completed normally).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Sanitized combined output.
    pub output: String,
    /// Error description for unsuccessful runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecuteCommandResponse {
    pub fn from_result(result: &CommandResult) -> Self {
        Self {
            success: result.success,
            exit_code: result.exit_code,
            output: result.output.clone(),
            error: result.error.as_ref().map(|e| e.to_string()),
            duration_ms: result.duration.as_millis() as u64,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "TUNNEL_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Whether repeating the request may succeed.
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        let mut response = Self::new(err.code(), err.to_string());
        response.retryable = err.is_retryable();
        if let GatewayError::StartFailure { source, .. } = err {
            response = response.with_details(format!("{:?}", source.kind()));
        }
        response
    }
}
