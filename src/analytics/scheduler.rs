//! Delayed tasks with cancellation.
//!
//! Every task is tied to a cancellation token. Cancelling the token before the
//! delay elapses drops the task without running it; a task that already ran is
//! unaffected.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a scheduled task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Fired,
    Cancelled,
}

/// A unit of deferred work.
pub struct DeferredTask {
    pub name: &'static str,
    pub delay: Duration,
    run: Box<dyn FnOnce() + Send + 'static>,
}

impl DeferredTask {
    pub fn new(name: &'static str, delay: Duration, run: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name,
            delay,
            run: Box::new(run),
        }
    }
}

impl std::fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTask")
            .field("name", &self.name)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Runs deferred tasks on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct DeferredScheduler {
    token: CancellationToken,
}

impl DeferredScheduler {
    /// Tasks are cancelled together with `parent`.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    pub fn schedule(&self, task: DeferredTask) -> JoinHandle<TaskOutcome> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(task = task.name, "Deferred task cancelled");
                    TaskOutcome::Cancelled
                }
                _ = tokio::time::sleep(task.delay) => {
                    tracing::debug!(task = task.name, delay_ms = task.delay.as_millis() as u64, "Deferred task fired");
                    (task.run)();
                    TaskOutcome::Fired
                }
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let scheduler = DeferredScheduler::new(&CancellationToken::new());

        let handle = scheduler.schedule(DeferredTask::new("t", Duration::from_millis(500), move || {
            flag.store(true, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(!fired.load(Ordering::SeqCst));

        assert_eq!(handle.await.unwrap(), TaskOutcome::Fired);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let parent = CancellationToken::new();
        let scheduler = DeferredScheduler::new(&parent);

        let handle = scheduler.schedule(DeferredTask::new("t", Duration::from_secs(3), move || {
            flag.store(true, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_secs(1)).await;
        parent.cancel();

        assert_eq!(handle.await.unwrap(), TaskOutcome::Cancelled);
        assert!(scheduler.is_cancelled());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
