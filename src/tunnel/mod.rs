//! Tunnel lifecycle management.
//!
//! A tunnel is a long-running external process that exposes a local tool
//! server to remote callers. This module provides:
//! - [`ProcessRegistry`]: one entry per identifier, guarded by one lock
//! - [`TunnelMonitor`]: readiness detection within a startup deadline
//! - [`TunnelManager`]: start/stop/list built on the two above
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use agent_gateway::execution::default_fixed_env;
//! use agent_gateway::tunnel::{ProcessRegistry, TunnelManager, TunnelMonitor, TunnelSpec};
//!
//! # async fn run() -> agent_gateway::Result<()> {
//! let manager = TunnelManager::new(
//!     Arc::new(ProcessRegistry::new()),
//!     TunnelMonitor::default(),
//!     default_fixed_env(),
//! );
//! let started = manager
//!     .start("memory", &TunnelSpec::share("mcpm", "memory", None, false))
//!     .await?;
//! println!("shared at {:?}", started.url);
//! println!("{}", manager.list()?);
//! manager.stop("memory").await?;
//! # Ok(())
//! # }
//! ```

mod manager;
mod monitor;
mod process;
mod registry;

pub use manager::{SharedTunnels, TunnelManager, TunnelSpec, TunnelStarted};
pub use monitor::{
    extract_url, FailureReason, MonitorOutcome, ReadinessMatcher, TunnelMonitor, DEFAULT_DEADLINE,
    DEFAULT_SUCCESS_MARKERS,
};
pub use process::TunnelProcess;
pub use registry::{Finalize, ProcessRegistry, Reservation, TunnelHandle, TunnelInfo};
