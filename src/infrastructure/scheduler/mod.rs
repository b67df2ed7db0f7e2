//! Scheduler implementations - real tokio timers and a manually driven clock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::application::errors::SchedulerError;
use crate::domain::traits::{Scheduler, Task, TaskHandle};

/// Runs tasks on a tokio runtime after `tokio::time::sleep`.
///
/// Without a pinned handle the ambient runtime is looked up on every call,
/// so scheduling outside a runtime context fails with `NoRuntime`.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn runtime(&self) -> Result<Handle, SchedulerError> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|e| SchedulerError::NoRuntime(e.to_string())),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle, SchedulerError> {
        let runtime = self.runtime()?;
        let handle = TaskHandle::new();
        let guard = handle.clone();

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.try_complete() {
                task();
            }
        });

        Ok(handle)
    }
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Tasks run in due-time order; ties run in scheduling order. Nothing runs
/// until the clock is advanced.
pub struct ManualScheduler {
    queue: Mutex<ManualQueue>,
    closed: AtomicBool,
}

struct ManualQueue {
    now: Duration,
    seq: u64,
    tasks: Vec<Scheduled>,
}

struct Scheduled {
    due: Duration,
    seq: u64,
    task: Task,
    handle: TaskHandle,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(ManualQueue {
                now: Duration::ZERO,
                seq: 0,
                tasks: Vec::new(),
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Refuse further scheduling. Already queued tasks still run.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn reopen(&self) {
        self.closed.store(false, Ordering::Release);
    }

    /// Time elapsed on the manual clock.
    pub fn now(&self) -> Duration {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    /// Tasks queued and not yet run (cancelled ones included until their
    /// due time passes).
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).tasks.len()
    }

    /// Move the clock forward, running every task that falls due, one by one.
    /// Tasks scheduled while advancing run too if they fall inside the window.
    /// Returns how many tasks actually ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;

        loop {
            let next = {
                let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
                let index = queue
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.due <= target)
                    .min_by_key(|(_, s)| (s.due, s.seq))
                    .map(|(i, _)| i);

                match index {
                    Some(i) => {
                        let scheduled = queue.tasks.swap_remove(i);
                        queue.now = scheduled.due;
                        Some(scheduled)
                    }
                    None => {
                        queue.now = target;
                        None
                    }
                }
            };

            // The lock is released here so the task may schedule more work.
            let Some(scheduled) = next else { break };
            if scheduled.handle.try_complete() {
                (scheduled.task)();
                ran += 1;
            }
        }

        ran
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle, SchedulerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::Closed);
        }

        let handle = TaskHandle::new();
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let due = queue.now + delay;
        queue.seq += 1;
        let seq = queue.seq;
        queue.tasks.push(Scheduled {
            due,
            seq,
            task,
            handle: handle.clone(),
        });
        Ok(handle)
    }
}
