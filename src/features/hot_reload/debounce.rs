//! Single-slot delayed task
//!
//! Scheduling while a run is pending cancels that run and starts the delay over,
//! so a burst of edits produces one registration once things settle.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct DelayedTask {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `job` after the delay, replacing any run still waiting
    ///
    /// Only the wait can be cancelled: once the delay has elapsed the job runs
    /// to completion on its own task.
    pub fn schedule<F, Fut>(&self, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let delay = self.delay;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(job());
        }));
    }

    /// Drop the pending run, if any
    pub fn cancel(&self) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
    }

    /// Whether a run is still waiting for its delay
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
