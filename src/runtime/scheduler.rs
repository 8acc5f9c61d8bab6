// Event Scheduler
// Single-consumer task queue serializing asynchronous status notifications
// and scheduled work. All application logic runs inside the consumer loop,
// so nothing ever mutates connection state concurrently.

use tokio::sync::mpsc;
use tracing::warn;

use crate::transport::NetStatus;

/// Work items the cooperative loop executes. Delivered strictly in
/// enqueue order; no priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// A network status notification handed off from the asynchronous
    /// notification context.
    Status(NetStatus),
    /// Open a transport session against the now-usable interface.
    OpenSession,
    /// Leave the dispatch loop.
    Shutdown,
}

/// The cooperative task queue. Owns the receiving end; any number of
/// [`SchedulerHandle`]s may enqueue.
#[derive(Debug)]
pub struct EventScheduler {
    tx: mpsc::UnboundedSender<Task>,
    rx: mpsc::UnboundedReceiver<Task>,
}

impl EventScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A cloneable handle for posting tasks from any context.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            tx: self.tx.clone(),
        }
    }

    /// Wait for the next task. Never returns `None` while the scheduler
    /// itself is alive, since it keeps a sender of its own.
    pub async fn next(&mut self) -> Option<Task> {
        self.rx.recv().await
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting side of the scheduler queue. Safe to call from asynchronous
/// notification contexts; it only enqueues, it never runs work.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl SchedulerHandle {
    pub fn post(&self, task: Task) {
        if self.tx.send(task).is_err() {
            warn!(?task, "task dropped: scheduler is gone");
        }
    }
}
