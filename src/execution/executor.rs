//! Command execution engine.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, warn};

use super::command::CommandInvocation;
use super::result::CommandResult;
use super::stream::{merge_output, piped};
use crate::error::GatewayError;
use crate::output::OutputSanitizer;

/// Overrides every child gets unless the invocation says otherwise.
pub fn default_fixed_env() -> BTreeMap<String, String> {
    [("NON_INTERACTIVE", "true"), ("FORCE", "true"), ("NO_COLOR", "true")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Runs external commands to completion.
///
/// `execute` occupies the calling task until the program exits. Each
/// upstream call runs on its own task, so a slow tool never holds up
/// unrelated calls.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    fixed_env: BTreeMap<String, String>,
}

impl CommandExecutor {
    /// Create an executor applying `fixed_env` to every child.
    pub fn new(fixed_env: BTreeMap<String, String>) -> Self {
        Self { fixed_env }
    }

    /// Fixed environment overrides.
    pub fn fixed_env(&self) -> &BTreeMap<String, String> {
        &self.fixed_env
    }

    /// Run the invocation, capturing combined output.
    ///
    /// Never fails: start failures and unsuccessful exits are reported
    /// through [`CommandResult::error`]. The child is reaped before this
    /// returns.
    pub async fn execute(&self, invocation: &CommandInvocation) -> CommandResult {
        let start = Instant::now();
        let line = invocation.display_line();

        let mut cmd = invocation.to_command(&self.fixed_env);
        let mut child = match piped(&mut cmd).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %line, error = %e, "failed to start command");
                return CommandResult::failed(
                    String::new(),
                    None,
                    GatewayError::start_failure(&invocation.program, e),
                    start.elapsed(),
                );
            }
        };

        let mut lines = merge_output(&mut child);
        let mut raw = String::new();
        while let Some(l) = lines.recv().await {
            raw.push_str(&l);
            raw.push('\n');
        }

        let status = child.wait().await;
        let output = OutputSanitizer::sanitize(&raw);
        let duration = start.elapsed();

        match status {
            Ok(status) if status.success() => {
                info!(command = %line, duration_ms = duration.as_millis() as u64, "command succeeded");
                CommandResult::succeeded(output, status.code(), duration)
            }
            Ok(status) => {
                warn!(command = %line, %status, duration_ms = duration.as_millis() as u64, "command failed");
                let error = GatewayError::execution_failure(status, output.clone());
                CommandResult::failed(output, status.code(), error, duration)
            }
            Err(e) => {
                warn!(command = %line, error = %e, "failed to wait for command");
                CommandResult::failed(output, None, GatewayError::Io(e), duration)
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(default_fixed_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandInvocation {
        CommandInvocation::new("sh").args(["-c", script])
    }

    #[test]
    fn test_default_fixed_env() {
        let env = default_fixed_env();
        assert_eq!(env.get("NON_INTERACTIVE").map(String::as_str), Some("true"));
        assert_eq!(env.get("FORCE").map(String::as_str), Some("true"));
        assert_eq!(env.get("NO_COLOR").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_execute_missing_binary() {
        let executor = CommandExecutor::default();
        let result = executor
            .execute(&CommandInvocation::new("nonexistent-binary-4d1f9"))
            .await;

        assert!(!result.success);
        assert!(result.is_start_failure());
        assert!(result.output.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_success_sanitized() {
        let executor = CommandExecutor::default();
        let result = executor
            .execute(&sh("printf '\\033[32mdone\\033[0m   \\n'"))
            .await;

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output, "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_merges_stderr() {
        let executor = CommandExecutor::default();
        let result = executor.execute(&sh("echo out; echo err 1>&2")).await;

        assert!(result.success);
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_nonzero_exit() {
        let executor = CommandExecutor::default();
        let result = executor.execute(&sh("echo broken; exit 3")).await;

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.output, "broken");
        match result.into_result() {
            Err(GatewayError::ExecutionFailure { output, .. }) => assert_eq!(output, "broken"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_env_precedence() {
        let executor = CommandExecutor::default();
        let inv = sh("echo $FORCE $NO_COLOR $EXTRA").env("FORCE", "false").env("EXTRA", "x");
        let result = executor.execute(&inv).await;

        assert_eq!(result.output, "false true x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_drops_noise() {
        let executor = CommandExecutor::default();
        let result = executor
            .execute(&sh("echo 'Warning: Input is not a terminal (fd=0).'; echo installed"))
            .await;

        assert_eq!(result.output, "installed");
    }
}
