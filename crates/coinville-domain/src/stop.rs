//! Cooperative shutdown signaling.
//!
//! One [`StopHandle`] is held by the lifecycle coordinator; every agent
//! task holds a [`StopSignal`] clone and checks it at each suspension
//! point. Once triggered the signal stays set for the rest of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
    stopped: AtomicBool,
    notify: Notify,
}

/// Trigger half of the stop signal.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

/// Observer half of the stop signal. Cheap to clone, one per agent task.
#[derive(Debug, Clone)]
pub struct StopSignal {
    shared: Arc<Shared>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// An observer tied to this handle.
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            shared: self.shared.clone(),
        }
    }

    /// Sets the signal and wakes every task blocked in
    /// [`StopSignal::stopped`]. Idempotent.
    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.notify.notify_waiters();
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been triggered.
    ///
    /// The notified future is created before the flag is re-checked, so a
    /// trigger landing between the check and the await is not lost.
    pub async fn stopped(&self) {
        loop {
            let notified = self.shared.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}
