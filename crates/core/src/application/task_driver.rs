//! Task Queue Driver (C11, §4.9 intake paragraph / §4.11) - drains pending
//! tasks on a slow interval and hands each to the Scheduler Core, grounded
//! in the original source's `_process_task_queue`.

use std::time::Duration;

use tracing::debug;

use super::scheduler::Scheduler;
use super::shutdown::ShutdownToken;
use super::task_store::TaskStore;

const DRAIN_INTERVAL: Duration = Duration::from_secs(2);

pub struct TaskDriver {
    tasks: std::sync::Arc<TaskStore>,
    scheduler: std::sync::Arc<Scheduler>,
}

impl TaskDriver {
    pub fn new(tasks: std::sync::Arc<TaskStore>, scheduler: std::sync::Arc<Scheduler>) -> Self {
        Self { tasks, scheduler }
    }

    pub async fn run(&self, mut shutdown: ShutdownToken) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(DRAIN_INTERVAL) => {
                    self.drain_once().await;
                }
                _ = shutdown.wait() => {
                    debug!("task driver shutting down");
                    return;
                }
            }
            if shutdown.is_shutdown() {
                return;
            }
        }
    }

    /// One drain tick: sorted intake, single-writer per task id (the
    /// `TaskStore::try_start` compare-and-swap is what actually enforces
    /// that, so concurrent dispatches here are safe even without a loop-wide
    /// lock).
    pub async fn drain_once(&self) {
        for task in self.tasks.list_pending() {
            self.scheduler.dispatch(&task).await;
        }
    }
}
