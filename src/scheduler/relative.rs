// Copyright (c) 2025 - Cowboy AI, Inc.
//! Time-Relative Scheduler Views
//!
//! A child stream started at absolute time `t` runs against
//! `scheduler_relative_to(t, scheduler)`. Inside, "now" reads as zero at the
//! moment of launch and every task sees local time. The child adapter that
//! listens to the stream adds `t` back; nothing else needs to know the
//! offset.

use std::rc::Rc;

use super::{Scheduler, SchedulerRef, Task};
use crate::disposable::Disposable;
use crate::stream::{Sink, Stream};
use crate::time::Time;

/// Scheduler view whose frame starts at `origin` of the parent view
pub struct RelativeScheduler {
    origin: Time,
    scheduler: SchedulerRef,
}

impl RelativeScheduler {
    /// Create a view of `scheduler` with time zero at `origin`
    pub fn new(origin: Time, scheduler: SchedulerRef) -> Self {
        Self { origin, scheduler }
    }
}

impl Scheduler for RelativeScheduler {
    fn current_time(&self) -> Time {
        self.scheduler.current_time() - self.origin
    }

    fn schedule_task(&self, local_offset: Time, delay: Time, task: Task) -> Box<dyn Disposable> {
        self.scheduler
            .schedule_task(local_offset + self.origin, delay, task)
    }
}

/// Shift `scheduler` so that `origin` reads as time zero
pub fn scheduler_relative_to(origin: Time, scheduler: SchedulerRef) -> SchedulerRef {
    Rc::new(RelativeScheduler::new(origin, scheduler))
}

/// Run `stream` as if it were subscribed at local time zero
///
/// `t` is the start time in `scheduler`'s frame. Notifications reach `sink`
/// in the stream's local frame.
pub fn run_relative<T: 'static>(
    t: Time,
    scheduler: SchedulerRef,
    stream: &Stream<T>,
    sink: Rc<dyn Sink<T>>,
) -> Box<dyn Disposable> {
    stream.run(sink, scheduler_relative_to(t, scheduler))
}
