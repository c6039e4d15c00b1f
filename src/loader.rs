use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Delay before the spinner appears for a slow request
pub const LOADER_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
struct LoaderState {
    in_flight: AtomicUsize,
    visible: AtomicBool,
    /// Bumped whenever the last request finishes, cancelling pending shows
    generation: AtomicU64,
}

/// Spinner shown only while requests have been outstanding for a while.
#[derive(Debug, Clone)]
pub struct LoaderIndicator {
    state: Arc<LoaderState>,
    delay: Duration,
}

impl Default for LoaderIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderIndicator {
    pub fn new() -> Self {
        Self::with_delay(LOADER_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: Arc::new(LoaderState::default()),
            delay,
        }
    }

    /// Mark a request as started; it ends when the guard is dropped.
    pub fn begin(&self) -> LoaderGuard {
        let previous = self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            let generation = self.state.generation.load(Ordering::SeqCst);
            let state = self.state.clone();
            let delay = self.delay;
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if state.generation.load(Ordering::SeqCst) == generation
                        && state.in_flight.load(Ordering::SeqCst) > 0
                    {
                        debug!("Showing loader");
                        state.visible.store(true, Ordering::SeqCst);
                    }
                });
            }
        }
        LoaderGuard {
            state: self.state.clone(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }
}

pub struct LoaderGuard {
    state: Arc<LoaderState>,
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        if self.state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.generation.fetch_add(1, Ordering::SeqCst);
            self.state.visible.store(false, Ordering::SeqCst);
        }
    }
}
