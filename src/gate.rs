use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admits at most one detail-pane fetch at a time.
///
/// There is no queue: a caller that cannot acquire simply drops its request.
/// The permit is released when it is dropped, so success and failure paths
/// both release exactly once.
#[derive(Debug, Clone)]
pub struct LoadGate {
    semaphore: Arc<Semaphore>,
    dropped: Arc<AtomicU64>,
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadGate {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move from idle to busy, or return `None` if already busy.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                debug!("Load gate acquired");
                Some(GatePermit { _permit: permit })
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Busy loading another commit...");
                None
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Number of requests rejected while busy
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Proof of holding the gate. Dropping it returns the gate to idle.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    pub fn release(self) {
        debug!("Load gate released");
    }
}
