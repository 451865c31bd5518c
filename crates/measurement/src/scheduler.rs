//! One-shot delayed flush timers.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns flush work onto the tracker's runtime.
///
/// Whether a timer is already pending is tracked by
/// [`HitQueue`](crate::queue::HitQueue), not here; the scheduler only runs
/// what it is handed.
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
    delay: Duration,
}

impl Scheduler {
    pub fn new(runtime: Handle, delay: Duration) -> Self {
        Self { runtime, delay }
    }

    /// Run `task` once, after the debounce delay.
    pub fn arm<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        debug!(delay_ms = delay.as_millis() as u64, "arming flush timer");

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        })
    }

    /// Run `task` right away.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task)
    }
}
