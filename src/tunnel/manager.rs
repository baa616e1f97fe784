//! Tunnel lifecycle orchestration: start, stop, list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::monitor::{extract_url, FailureReason, MonitorOutcome, TunnelMonitor};
use super::process::TunnelProcess;
use super::registry::{Finalize, ProcessRegistry, Reservation};
use crate::error::GatewayError;
use crate::execution::{merge_output, piped, CommandInvocation};
use crate::Result;

/// How to launch a tunnel process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSpec {
    pub invocation: CommandInvocation,
}

impl TunnelSpec {
    pub fn new(invocation: CommandInvocation) -> Self {
        Self { invocation }
    }

    /// `<program> share <name> [--port <port>] [--no-auth]`
    pub fn share(program: &str, name: &str, port: Option<u16>, no_auth: bool) -> Self {
        let mut invocation = CommandInvocation::new(program).args(["share", name]);
        if let Some(port) = port {
            invocation = invocation.args(["--port".to_string(), port.to_string()]);
        }
        if no_auth {
            invocation = invocation.arg("--no-auth");
        }
        Self { invocation }
    }
}

/// A tunnel that reached readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelStarted {
    pub id: String,
    /// Access URL reported by the process, if one could be extracted.
    pub url: Option<String>,
    /// Sanitized output captured up to readiness.
    pub output: String,
}

/// Snapshot of shared tunnel identifiers, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedTunnels(Vec<String>);

impl SharedTunnels {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|s| s == id)
    }
}

impl FromIterator<String> for SharedTunnels {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut ids: Vec<String> = iter.into_iter().collect();
        ids.sort();
        Self(ids)
    }
}

impl fmt::Display for SharedTunnels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("No servers are currently being shared.");
        }
        f.write_str("Currently shared servers:")?;
        for id in &self.0 {
            write!(f, "\n- {}", id)?;
        }
        Ok(())
    }
}

/// Starts, stops and lists tunnels.
///
/// Per identifier: unregistered -> starting -> active -> unregistered,
/// with starting falling straight back to unregistered (process killed,
/// entry removed) when readiness is not observed.
pub struct TunnelManager {
    registry: Arc<ProcessRegistry>,
    monitor: TunnelMonitor,
    fixed_env: BTreeMap<String, String>,
}

impl TunnelManager {
    pub fn new(
        registry: Arc<ProcessRegistry>,
        monitor: TunnelMonitor,
        fixed_env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            registry,
            monitor,
            fixed_env,
        }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn monitor(&self) -> &TunnelMonitor {
        &self.monitor
    }

    /// Spawn the tunnel for `id` and wait for it to become ready.
    ///
    /// Returns within the monitor deadline. On any failure the process is
    /// killed and the registration removed before the error is returned.
    /// Dropping the future before it resolves does the same.
    pub async fn start(&self, id: &str, spec: &TunnelSpec) -> Result<TunnelStarted> {
        let reservation = self
            .registry
            .reserve(id)?
            .ok_or_else(|| GatewayError::DuplicateTunnel(id.to_string()))?;
        let pending = PendingStart::new(Arc::clone(&self.registry), reservation.clone());

        let line = spec.invocation.display_line();
        info!(tunnel = id, command = %line, "starting tunnel");

        let mut cmd = spec.invocation.to_command(&self.fixed_env);
        let mut child = match piped(&mut cmd).spawn() {
            Ok(child) => child,
            Err(e) => {
                self.registry.release(&reservation)?;
                warn!(tunnel = id, error = %e, "failed to spawn tunnel process");
                return Err(GatewayError::start_failure(&spec.invocation.program, e));
            }
        };

        let lines = merge_output(&mut child);
        let process = TunnelProcess::new(child);
        let pid = process.pid();

        if let Finalize::Withdrawn(mut process) = self.registry.finalize(&reservation, process)? {
            warn!(tunnel = id, "tunnel stopped while spawning");
            kill_quietly(id, &mut process).await;
            return Err(GatewayError::TunnelNotFound(id.to_string()));
        }

        match self.monitor.watch(lines).await {
            MonitorOutcome::Success { output } => {
                if !self.registry.is_current(&reservation)? {
                    warn!(tunnel = id, "tunnel stopped before it became ready");
                    return Err(GatewayError::TunnelNotFound(id.to_string()));
                }
                pending.disarm();
                let url = extract_url(&output).map(str::to_string);
                info!(tunnel = id, pid = ?pid, url = ?url, "tunnel active");
                Ok(TunnelStarted {
                    id: id.to_string(),
                    url,
                    output,
                })
            }
            MonitorOutcome::Failure { output, reason } => {
                if let Some(mut process) = self
                    .registry
                    .release(&reservation)?
                    .and_then(|h| h.into_process())
                {
                    kill_quietly(id, &mut process).await;
                }
                warn!(tunnel = id, %reason, "tunnel failed to start");

                let id = id.to_string();
                Err(match reason {
                    FailureReason::DeadlineExceeded => GatewayError::MonitorTimeout { id, output },
                    FailureReason::ProcessExited => GatewayError::MonitorProcessExit { id, output },
                })
            }
        }
    }

    /// Stop sharing `id`. The process's own exit status is irrelevant.
    pub async fn stop(&self, id: &str) -> Result<()> {
        let handle = self
            .registry
            .remove(id)?
            .ok_or_else(|| GatewayError::TunnelNotFound(id.to_string()))?;

        if let Some(mut process) = handle.into_process() {
            kill_quietly(id, &mut process).await;
        }
        info!(tunnel = id, "tunnel stopped");
        Ok(())
    }

    /// Snapshot of shared identifiers.
    pub fn list(&self) -> Result<SharedTunnels> {
        self.registry.list().map(SharedTunnels)
    }

    /// Kill every registered tunnel. Returns how many were stopped.
    pub async fn shutdown(&self) -> Result<usize> {
        let handles = self.registry.drain()?;
        let count = handles.len();

        for handle in handles {
            let id = handle.id().to_string();
            if let Some(mut process) = handle.into_process() {
                kill_quietly(&id, &mut process).await;
            }
        }
        if count > 0 {
            info!(count, "stopped all tunnels");
        }
        Ok(count)
    }
}

/// Releases a reservation whose `start` never reached readiness.
///
/// Covers cancellation: if the `start` future is dropped mid-flight the
/// entry is released here, and dropping the released handle kills the
/// child through `kill_on_drop`. Releasing is generation-checked, so a
/// newer tunnel under the same id is never touched.
struct PendingStart {
    registry: Arc<ProcessRegistry>,
    reservation: Option<Reservation>,
}

impl PendingStart {
    fn new(registry: Arc<ProcessRegistry>, reservation: Reservation) -> Self {
        Self {
            registry,
            reservation: Some(reservation),
        }
    }

    fn disarm(mut self) {
        self.reservation = None;
    }
}

impl Drop for PendingStart {
    fn drop(&mut self) {
        let Some(reservation) = self.reservation.take() else {
            return;
        };
        if let Ok(Some(handle)) = self.registry.release(&reservation) {
            warn!(tunnel = reservation.id(), pid = ?handle.pid(), "tunnel start abandoned");
        }
    }
}

/// Cleanup kills never fail the surrounding operation.
async fn kill_quietly(id: &str, process: &mut TunnelProcess) {
    if let Err(e) = process.kill().await {
        warn!(tunnel = id, pid = ?process.pid(), error = %e, "failed to kill tunnel process");
    }
}
