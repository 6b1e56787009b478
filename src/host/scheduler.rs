//! Frame and timer queue shared by concrete hosts.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use super::Task;

struct PendingTimer {
    due: Duration,
    seq: u64,
    task: Task,
}

/// Pending frame callbacks and timers, measured against a host-supplied clock.
///
/// The queue never runs anything by itself; the host pumps it. Timers with the
/// same due time fire in insertion order.
#[derive(Default)]
pub struct TaskQueue {
    frames: RefCell<VecDeque<Task>>,
    timers: RefCell<Vec<PendingTimer>>,
    seq: Cell<u64>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&self, task: Task) {
        self.frames.borrow_mut().push_back(task);
    }

    pub fn push_timer(&self, due: Duration, task: Task) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.timers.borrow_mut().push(PendingTimer { due, seq, task });
    }

    /// Runs every callback queued before this frame started. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<Task> = self.frames.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Earliest due time among pending timers.
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.borrow().iter().map(|t| t.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    pub fn pop_due(&self, now: Duration) -> Option<(Duration, Task)> {
        let mut timers = self.timers.borrow_mut();
        let idx = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = timers.swap_remove(idx);
        Some((timer.due, timer.task))
    }

    pub fn is_idle(&self) -> bool {
        self.pending_frames() == 0 && self.pending_timers() == 0
    }
}
