//! # agent-gateway
//!
//! Local gateway that lets AI agents run command-line tools and share
//! tool servers through long-running tunnel processes.
//!
//! ## Features
//!
//! - **Command execution**: run a program to completion with a fixed,
//!   non-interactive environment and get back sanitized output
//! - **Tunnels**: spawn a sharing process, wait for its public URL within a
//!   deadline, and track it by identifier until it is stopped
//! - **Sanitized output**: ANSI sequences and known terminal noise removed
//! - **HTTP API**: axum endpoints with optional API key authentication
//!
//! ## Quick Start
//!
//! ```no_run
//! use agent_gateway::{CommandExecutor, CommandInvocation};
//!
//! #[tokio::main]
//! async fn main() -> agent_gateway::Result<()> {
//!     agent_gateway::logging::try_init().ok();
//!
//!     let executor = CommandExecutor::default();
//!     let result = executor
//!         .execute(&CommandInvocation::new("mcpm").arg("ls"))
//!         .await;
//!
//!     println!("{}", result.into_result()?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod security;
pub mod tunnel;

// Re-export commonly used types
pub use error::{GatewayError, Result};
pub use execution::{CommandExecutor, CommandInvocation, CommandResult};
pub use output::OutputSanitizer;
pub use tunnel::{
    MonitorOutcome, ProcessRegistry, SharedTunnels, TunnelManager, TunnelMonitor, TunnelSpec,
    TunnelStarted,
};
