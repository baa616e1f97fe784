//! Execution result types.

use std::time::Duration;

use crate::error::GatewayError;

/// Outcome of one external command run to completion.
#[derive(Debug)]
pub struct CommandResult {
    /// Sanitized combined stdout/stderr.
    pub output: String,
    /// Whether the program started and exited with status zero.
    pub success: bool,
    /// Exit code, when the program ran and was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Underlying error, for start failures and unsuccessful exits.
    pub error: Option<GatewayError>,
    /// Wall-clock duration.
    pub duration: Duration,
}

impl CommandResult {
    /// A run that exited with status zero.
    pub fn succeeded(output: String, exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            output,
            success: true,
            exit_code,
            error: None,
            duration,
        }
    }

    /// A run that failed to start or exited unsuccessfully.
    pub fn failed(
        output: String,
        exit_code: Option<i32>,
        error: GatewayError,
        duration: Duration,
    ) -> Self {
        Self {
            output,
            success: false,
            exit_code,
            error: Some(error),
            duration,
        }
    }

    /// Whether the program never ran.
    pub fn is_start_failure(&self) -> bool {
        matches!(self.error, Some(GatewayError::StartFailure { .. }))
    }

    /// Get output lines.
    pub fn output_lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    /// Convert into the sanitized output, or the classified error.
    pub fn into_result(self) -> crate::Result<String> {
        match self.error {
            None => Ok(self.output),
            Some(err) => Err(err),
        }
    }
}
