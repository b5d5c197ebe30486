//! One-shot timer capability used for heartbeat scheduling
//!
//! Heartbeats are rescheduled on every firing instead of running on a fixed
//! period, because the Repository may advertise a new interval in each
//! Update response.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Work run when a timer fires
pub type TimerTask = BoxFuture<'static, ()>;

/// Handle to a scheduled one-shot firing
///
/// Stopping is idempotent. It prevents a firing that has not started yet;
/// once the task is running, stopping the handle has no effect on it.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancel: CancellationToken,
}

impl TimerHandle {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Schedules a task to run once after a delay
pub trait Scheduler: Send + Sync {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle;
}

/// [`Scheduler`] backed by a spawned tokio task
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();

        tokio::spawn(async move {
            let fired = tokio::select! {
                () = guard.cancelled() => false,
                () = tokio::time::sleep(after) => true,
            };
            if fired {
                task.await;
            }
        });

        TimerHandle::new(cancel)
    }
}
