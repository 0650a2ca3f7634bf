//! Animation timers and their cleanup.
//!
//! Every timer scheduled during playback goes through [`TimerReaper`], which
//! keeps the handle. Leaving playback drains the reaper and cancels exactly
//! those timers; timers owned by anything else are left alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tracing::debug;

/// Handle of a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Work run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run callbacks later.
///
/// Cancelling a handle that already fired, or was never issued, does nothing.
pub trait Scheduler: Send {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Owns the timers of one playback session.
pub struct TimerReaper {
    scheduler: Box<dyn Scheduler>,
    pending: Vec<TimerHandle>,
}

impl TimerReaper {
    pub fn new(scheduler: impl Scheduler + 'static) -> Self {
        Self {
            scheduler: Box::new(scheduler),
            pending: Vec::new(),
        }
    }

    /// Schedule a callback and remember its handle.
    pub fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = self.scheduler.schedule(delay, callback);
        self.pending.push(handle);
        handle
    }

    /// Handles scheduled since the last sweep.
    pub fn pending(&self) -> &[TimerHandle] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cancel every timer scheduled since the last sweep.
    ///
    /// Returns how many handles were cancelled.
    pub fn cancel_all_pending(&mut self) -> usize {
        let count = self.pending.len();
        for handle in self.pending.drain(..) {
            self.scheduler.cancel(handle);
        }
        debug!(count, "cancelled pending timers");
        count
    }
}

impl std::fmt::Debug for TimerReaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerReaper")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

/// Runs each timer as a tokio task. Must be used inside a runtime.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    next: u64,
    tasks: HashMap<TimerHandle, AbortHandle>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers that have neither fired nor been cancelled.
    pub fn live_count(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next += 1;
        let handle = TimerHandle(self.next);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        self.tasks.insert(handle, task.abort_handle());
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

struct ManualEntry {
    deadline: Duration,
    handle: TimerHandle,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next: u64,
    queue: Vec<ManualEntry>,
    cancelled: usize,
}

/// Virtual-clock scheduler for deterministic tests and headless replays.
///
/// Clones share the same clock, so a test can keep one clone while the
/// reaper owns another.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_clock<T>(&self, f: impl FnOnce(&mut ManualClock) -> T) -> T {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut clock)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.with_clock(|c| c.now)
    }

    /// Timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.with_clock(|c| c.queue.len())
    }

    /// Timers removed by `cancel` before they fired.
    pub fn cancelled(&self) -> usize {
        self.with_clock(|c| c.cancelled)
    }

    /// Move the clock forward, firing due timers in deadline order.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;

        loop {
            let due = self.with_clock(|c| {
                let idx = c
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.deadline <= target)
                    .min_by_key(|(_, e)| (e.deadline, e.handle))
                    .map(|(i, _)| i)?;
                let entry = c.queue.swap_remove(idx);
                c.now = entry.deadline;
                Some(entry)
            });

            // Run outside the lock so callbacks may touch the scheduler.
            match due {
                Some(entry) => {
                    (entry.callback)();
                    fired += 1;
                }
                None => break,
            }
        }

        self.with_clock(|c| c.now = target);
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        self.with_clock(|c| {
            c.next += 1;
            let handle = TimerHandle(c.next);
            c.queue.push(ManualEntry {
                deadline: c.now + delay,
                handle,
                callback,
            });
            handle
        })
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.with_clock(|c| {
            let before = c.queue.len();
            c.queue.retain(|e| e.handle != handle);
            c.cancelled += before - c.queue.len();
        })
    }
}
