//! Registry of active tunnels.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::process::TunnelProcess;
use crate::error::GatewayError;
use crate::Result;

/// Global counter for registration generations.
static GENERATION: AtomicU64 = AtomicU64::new(1);

/// Registry entry for one tunnel identifier.
///
/// Starts as a placeholder (no process) on registration and holds the
/// live process once spawning succeeded.
#[derive(Debug)]
pub struct TunnelHandle {
    id: String,
    generation: u64,
    process: Option<TunnelProcess>,
    created_at: Instant,
}

impl TunnelHandle {
    fn placeholder(id: String) -> Self {
        Self {
            id,
            generation: GENERATION.fetch_add(1, Ordering::Relaxed),
            process: None,
            created_at: Instant::now(),
        }
    }

    /// Tunnel identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Generation assigned at registration.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether spawning has not completed yet.
    pub fn is_placeholder(&self) -> bool {
        self.process.is_none()
    }

    /// PID of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(TunnelProcess::pid)
    }

    /// Time since registration.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Give up ownership of the process.
    pub fn into_process(self) -> Option<TunnelProcess> {
        self.process
    }
}

/// Proof of a successful registration, used to finalize or release
/// exactly the entry that was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: String,
    generation: u64,
}

impl Reservation {
    /// Tunnel identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Result of [`ProcessRegistry::finalize`].
#[derive(Debug)]
pub enum Finalize {
    /// The process now backs the entry.
    Installed,
    /// The placeholder was removed before spawning finished; the caller
    /// owns the process again and must dispose of it.
    Withdrawn(TunnelProcess),
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelInfo {
    pub id: String,
    pub pid: Option<u32>,
    pub active: bool,
    pub age: Duration,
}

/// Thread-safe map from tunnel identifier to its handle.
///
/// All mutations happen under one lock; the lock is never held across an
/// await point and callers never get references into the map.
pub struct ProcessRegistry {
    tunnels: Mutex<BTreeMap<String, TunnelHandle>>,
}

impl ProcessRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tunnels: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, TunnelHandle>>> {
        self.tunnels.lock().map_err(|_| GatewayError::LockPoisoned)
    }

    /// Insert a placeholder for `id`.
    ///
    /// Returns `None` if `id` is already registered.
    pub fn reserve(&self, id: &str) -> Result<Option<Reservation>> {
        let mut tunnels = self.lock()?;
        if tunnels.contains_key(id) {
            return Ok(None);
        }

        let handle = TunnelHandle::placeholder(id.to_string());
        let reservation = Reservation {
            id: id.to_string(),
            generation: handle.generation,
        };
        tunnels.insert(id.to_string(), handle);
        Ok(Some(reservation))
    }

    /// Insert a placeholder for `id`; `false` means it is already taken.
    pub fn register(&self, id: &str) -> Result<bool> {
        self.reserve(id).map(|r| r.is_some())
    }

    /// Attach the spawned process to the reserved placeholder.
    pub fn finalize(&self, reservation: &Reservation, process: TunnelProcess) -> Result<Finalize> {
        let mut tunnels = self.lock()?;
        match tunnels.get_mut(&reservation.id) {
            Some(handle) if handle.generation == reservation.generation => {
                handle.process = Some(process);
                Ok(Finalize::Installed)
            }
            _ => Ok(Finalize::Withdrawn(process)),
        }
    }

    /// Remove and return the entry for `id`. Missing ids are not an error.
    pub fn remove(&self, id: &str) -> Result<Option<TunnelHandle>> {
        Ok(self.lock()?.remove(id))
    }

    /// Remove the entry only if it is still the one `reservation` created.
    pub fn release(&self, reservation: &Reservation) -> Result<Option<TunnelHandle>> {
        let mut tunnels = self.lock()?;
        if !Self::holds(&tunnels, reservation) {
            return Ok(None);
        }
        Ok(tunnels.remove(&reservation.id))
    }

    /// Whether the entry created by `reservation` is still registered.
    pub fn is_current(&self, reservation: &Reservation) -> Result<bool> {
        let tunnels = self.lock()?;
        Ok(Self::holds(&tunnels, reservation))
    }

    fn holds(tunnels: &BTreeMap<String, TunnelHandle>, reservation: &Reservation) -> bool {
        tunnels
            .get(&reservation.id)
            .is_some_and(|h| h.generation == reservation.generation)
    }

    /// Sorted snapshot of registered identifiers.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    /// Sorted snapshot with process details.
    pub fn describe(&self) -> Result<Vec<TunnelInfo>> {
        Ok(self
            .lock()?
            .values()
            .map(|h| TunnelInfo {
                id: h.id.clone(),
                pid: h.pid(),
                active: !h.is_placeholder(),
                age: h.age(),
            })
            .collect())
    }

    /// Check if `id` is registered.
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(id))
    }

    /// Number of registered tunnels. A poisoned lock reads as zero.
    pub fn count(&self) -> usize {
        self.tunnels.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Remove every entry and return them.
    pub fn drain(&self) -> Result<Vec<TunnelHandle>> {
        let mut tunnels = self.lock()?;
        Ok(std::mem::take(&mut *tunnels).into_values().collect())
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
