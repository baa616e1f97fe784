//! Owned handle to a running tunnel process.

use std::time::SystemTime;

use tokio::process::Child;

/// A spawned tunnel process.
///
/// Dropping it kills the child (the command is spawned with
/// `kill_on_drop`), so a handle can never leak a running process.
#[derive(Debug)]
pub struct TunnelProcess {
    child: Child,
    pid: Option<u32>,
    started_at: SystemTime,
}

impl TunnelProcess {
    /// Wrap a freshly spawned child.
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child,
            pid,
            started_at: SystemTime::now(),
        }
    }

    /// OS process id, if it was still running when wrapped.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wall-clock spawn time.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Whether the process has already exited.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Kill the process and reap it. A process that already exited
    /// counts as killed.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.kill().await
    }
}
