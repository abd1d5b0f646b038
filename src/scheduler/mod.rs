// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scheduler Abstraction
//!
//! A scheduler answers "what time is it" and runs tasks later. Streams never
//! read a wall clock; they ask the scheduler they were run with.
//!
//! # Frames
//!
//! Every scheduler view has a frame. The root scheduler's frame is absolute
//! time. [`relative::RelativeScheduler`] shifts the frame so that a child
//! stream sees time zero at the moment it was started:
//!
//! ```text
//! absolute:  0 ─── 10 ─── 15 ─── 20 ──→
//! relative(10):    0 ──── 5 ──── 10 ──→
//! ```
//!
//! Tasks receive the time of the frame they were scheduled in.

pub mod relative;

pub use relative::{run_relative, scheduler_relative_to, RelativeScheduler};

use std::rc::Rc;

use crate::disposable::Disposable;
use crate::time::Time;

/// Work to run at a scheduled time, receiving that time in its own frame
pub type Task = Box<dyn FnOnce(Time)>;

/// Shared handle to a scheduler view
pub type SchedulerRef = Rc<dyn Scheduler>;

/// Source of time and deferred execution
pub trait Scheduler {
    /// Current time in this view's frame
    fn current_time(&self) -> Time;

    /// Run `task` after `delay`
    ///
    /// `local_offset` is the origin of the frame the task expects its time
    /// in, relative to this view. The task is called with
    /// `current_time() - local_offset` at the moment it runs. The returned
    /// handle cancels the task if it has not run yet.
    fn schedule_task(&self, local_offset: Time, delay: Time, task: Task) -> Box<dyn Disposable>;

    /// Run `task` after `delay`, in this view's frame
    fn delay(&self, delay: Time, task: Task) -> Box<dyn Disposable> {
        self.schedule_task(0, delay, task)
    }

    /// Run `task` as soon as possible, in this view's frame
    fn asap(&self, task: Task) -> Box<dyn Disposable> {
        self.schedule_task(0, 0, task)
    }
}
