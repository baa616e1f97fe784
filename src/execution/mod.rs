//! Command execution engine.
//!
//! This module provides the single primitive through which the gateway
//! runs external binaries:
//! - Environment layering (inherited, fixed overrides, per-call overrides)
//! - Combined stdout/stderr capture
//! - Sanitized, classified results
//!
//! # Example
//!
//! ```no_run
//! use agent_gateway::execution::{CommandExecutor, CommandInvocation};
//!
//! # async fn run() {
//! let executor = CommandExecutor::default();
//! let result = executor
//!     .execute(&CommandInvocation::new("mcpm").args(["ls"]))
//!     .await;
//! println!("success={} output={}", result.success, result.output);
//! # }
//! ```

mod command;
mod executor;
mod result;
mod stream;

pub use command::CommandInvocation;
pub use executor::{default_fixed_env, CommandExecutor};
pub use result::CommandResult;
pub use stream::{forward_lines, merge_output, LINE_CHANNEL_CAPACITY};
pub(crate) use stream::piped;
