//! Outstanding resolution task tracking

use std::sync::Arc;
use tokio::sync::watch;

/// Re-armable counter of in-flight resolution tasks
///
/// Tasks register with [`PendingTasks::begin`] before they are spawned and
/// deregister when the returned guard drops, including on panic. Waiters
/// resume once the count reaches zero; the counter can go back up
/// afterwards.
#[derive(Debug, Clone)]
pub(crate) struct PendingTasks {
    count: Arc<watch::Sender<usize>>,
}

impl PendingTasks {
    pub(crate) fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }

    /// Register a task
    pub(crate) fn begin(&self) -> PendingGuard {
        self.count.send_modify(|n| *n += 1);
        PendingGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Number of tasks still running
    pub(crate) fn get(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until no task is running
    pub(crate) async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Deregisters its task on drop
#[derive(Debug)]
pub(crate) struct PendingGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
