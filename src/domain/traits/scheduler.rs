use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::SchedulerError;

/// Deferred unit of work handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

const PENDING: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// Scheduler trait - runs a task once after a delay.
///
/// Implementations must call [`TaskHandle::try_complete`] right before running
/// the task and skip it when that returns `false` (the task was cancelled).
/// `schedule` never runs the task itself before returning.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle, SchedulerError>;
}

/// Shared view of one scheduled task's lifecycle
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Arc<AtomicU8>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    /// Cancel if still pending. Returns `true` when this call cancelled it.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the task for execution. Exactly one of `cancel`/`try_complete` wins.
    pub fn try_complete(&self) -> bool {
        self.state
            .compare_exchange(PENDING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == FINISHED
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}
