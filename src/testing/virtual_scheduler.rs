// Copyright (c) 2025 - Cowboy AI, Inc.
//! Virtual-time scheduler
//!
//! Time only moves when the owner calls [`VirtualScheduler::run`] or
//! [`VirtualScheduler::advance_to`]. Tasks due at the same instant run in the
//! order they were scheduled.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::disposable::{dispose_with, Disposable};
use crate::scheduler::{Scheduler, SchedulerRef, Task};
use crate::time::Time;

struct ScheduledTask {
    local_offset: Time,
    task: Task,
}

#[derive(Default)]
struct Timeline {
    now: Time,
    next_seq: u64,
    queue: BinaryHeap<Reverse<(Time, u64)>>,
    tasks: HashMap<u64, ScheduledTask>,
}

impl Timeline {
    /// Pop the next live task due no later than `limit`
    fn pop_due(&mut self, limit: Option<Time>) -> Option<(Time, ScheduledTask)> {
        while let Some(Reverse((at, seq))) = self.queue.peek().copied() {
            if limit.is_some_and(|limit| at > limit) {
                return None;
            }
            self.queue.pop();
            if let Some(task) = self.tasks.remove(&seq) {
                self.now = self.now.max(at);
                return Some((at, task));
            }
        }
        None
    }
}

/// Scheduler driven by explicit time advancement
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    timeline: Rc<RefCell<Timeline>>,
}

impl VirtualScheduler {
    /// Create a scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for running streams
    pub fn handle(&self) -> SchedulerRef {
        Rc::new(self.clone())
    }

    /// Current absolute time
    pub fn now(&self) -> Time {
        self.timeline.borrow().now
    }

    /// Number of tasks scheduled and not yet run or cancelled
    pub fn pending_tasks(&self) -> usize {
        self.timeline.borrow().tasks.len()
    }

    /// Run every task, including ones scheduled while running, in time order
    pub fn run(&self) {
        while self.run_next(None) {}
    }

    /// Run every task due at or before `t`, then move the clock to `t`
    pub fn advance_to(&self, t: Time) {
        while self.run_next(Some(t)) {}
        let mut timeline = self.timeline.borrow_mut();
        timeline.now = timeline.now.max(t);
    }

    fn run_next(&self, limit: Option<Time>) -> bool {
        // The borrow must end before the task runs: tasks schedule more tasks.
        let next = self.timeline.borrow_mut().pop_due(limit);
        match next {
            Some((at, scheduled)) => {
                trace!(time = at, "Running scheduled task");
                (scheduled.task)(at - scheduled.local_offset);
                true
            }
            None => false,
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn current_time(&self) -> Time {
        self.now()
    }

    fn schedule_task(&self, local_offset: Time, delay: Time, task: Task) -> Box<dyn Disposable> {
        let seq = {
            let mut timeline = self.timeline.borrow_mut();
            let at = timeline.now + delay.max(0);
            let seq = timeline.next_seq;
            timeline.next_seq += 1;
            timeline.queue.push(Reverse((at, seq)));
            timeline.tasks.insert(seq, ScheduledTask { local_offset, task });
            seq
        };

        let timeline: Weak<RefCell<Timeline>> = Rc::downgrade(&self.timeline);
        dispose_with(move || {
            if let Some(timeline) = timeline.upgrade() {
                timeline.borrow_mut().tasks.remove(&seq);
            }
            Ok(())
        })
    }
}
