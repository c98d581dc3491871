// =============================================================================
// Scheduler: one periodic refresh task per app instance
// =============================================================================
//
// Starting a task aborts the previous one first, so a mode switch can never
// leave two refresh loops running. The first tick fires immediately.
// `BusyFlag` additionally skips a cycle when the previous one (or a manual
// refresh) is still in flight.
// =============================================================================

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Default)]
pub struct Scheduler {
    task: Mutex<Option<(String, JoinHandle<()>)>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running task with one calling `tick` every `period`.
    pub fn start<F, Fut>(&self, label: &str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.task.lock();
        if let Some((old, handle)) = slot.take() {
            handle.abort();
            debug!(task = %old, "previous refresh task aborted");
        }

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick().await;
            }
        });

        info!(task = %label, period_ms = period.as_millis() as u64, "refresh task started");
        *slot = Some((label.to_string(), handle));
    }

    /// Abort the running task. Returns whether there was one.
    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some((label, handle)) => {
                handle.abort();
                info!(task = %label, "refresh task stopped");
                true
            }
            None => false,
        }
    }

    /// Label of the live task, if any.
    pub fn current(&self) -> Option<String> {
        self.task
            .lock()
            .as_ref()
            .filter(|(_, h)| !h.is_finished())
            .map(|(label, _)| label.clone())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Skip-if-busy guard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

/// Held for the duration of one cycle; clears the flag on drop.
pub struct BusyGuard<'a>(&'a BusyFlag);

impl BusyFlag {
    /// `None` when a cycle is already running.
    pub fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(self))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}
