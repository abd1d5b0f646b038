// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-frp-merge
//!
//! Deterministic sources, mappers and sinks for merge tests.
//!
//! # Design Principles
//! - All time is virtual; nothing reads a wall clock
//! - Every child stream created by a fixture mapper is tracked, so tests can
//!   ask when it was started and whether its handle was released

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cim_frp_merge::disposable::dispose_with;
use cim_frp_merge::testing::{ScriptedStream, SubscriptionProbe, VirtualScheduler};
use cim_frp_merge::{
    Disposable, Notification, SchedulerRef, Sink, Source, Stream, StreamError, Time,
};

/// Shorthand for an event notification
pub fn event<T>(time: Time, value: T) -> Notification<T> {
    Notification::Event { time, value }
}

/// Shorthand for an end notification
pub fn end<T>(time: Time) -> Notification<T> {
    Notification::End { time }
}

/// Source emitting every value at t = 0, then ending at t = 0
pub fn burst<T: Clone + 'static>(values: Vec<T>) -> ScriptedStream<T> {
    let mut script: Vec<Notification<T>> = values.into_iter().map(|v| event(0, v)).collect();
    script.push(end(0));
    ScriptedStream::new(script)
}

/// A child stream started by a [`ChildTracker`] mapper
#[derive(Debug, Clone)]
pub struct TrackedChild<T> {
    pub value: T,
    pub started_at: Time,
    pub probe: SubscriptionProbe,
}

/// Mapper factory recording every child it creates
///
/// Each value `v` is mapped to a child that emits `v` after `delay(v)` and
/// then ends.
pub struct ChildTracker<T> {
    scheduler: VirtualScheduler,
    children: Rc<RefCell<Vec<TrackedChild<T>>>>,
}

impl<T: Clone + 'static> ChildTracker<T> {
    pub fn new(scheduler: &VirtualScheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            children: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Mapper producing delayed single-value children
    pub fn mapper<D>(&self, delay: D) -> impl Fn(T) -> Stream<T> + 'static
    where
        D: Fn(&T) -> Time + 'static,
    {
        let scheduler = self.scheduler.clone();
        let children = Rc::clone(&self.children);
        move |value: T| {
            let child = ScriptedStream::delayed(delay(&value), value.clone());
            children.borrow_mut().push(TrackedChild {
                value,
                started_at: scheduler.now(),
                probe: child.probe(),
            });
            child.into_stream()
        }
    }

    /// Every child created so far, in creation order
    pub fn children(&self) -> Vec<TrackedChild<T>> {
        self.children.borrow().clone()
    }

    /// Values mapped so far, in mapping order
    pub fn mapped(&self) -> Vec<T> {
        self.children
            .borrow()
            .iter()
            .map(|child| child.value.clone())
            .collect()
    }

    /// Children subscribed and not yet released
    pub fn open(&self) -> usize {
        self.children
            .borrow()
            .iter()
            .map(|child| child.probe.open())
            .sum()
    }

    /// Time the child for `value` was started
    pub fn started_at(&self, value: &T) -> Option<Time>
    where
        T: PartialEq,
    {
        self.children
            .borrow()
            .iter()
            .find(|child| &child.value == value)
            .map(|child| child.started_at)
    }
}

/// Subscribe and release counts of an [`ImmediateStream`]
#[derive(Debug, Clone, Default)]
pub struct HandleCounts {
    subscribed: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl HandleCounts {
    pub fn subscriptions(&self) -> usize {
        self.subscribed.get()
    }

    pub fn releases(&self) -> usize {
        self.released.get()
    }
}

/// Stream delivering all its values and its end inside `run`
///
/// Everything happens at the scheduler's current time, before the
/// subscription handle is returned.
pub struct ImmediateStream<T> {
    values: Vec<T>,
    counts: HandleCounts,
}

impl<T> ImmediateStream<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            counts: HandleCounts::default(),
        }
    }

    pub fn counts(&self) -> HandleCounts {
        self.counts.clone()
    }
}

impl<T: Clone + 'static> Source<T> for ImmediateStream<T> {
    fn run(&self, sink: Rc<dyn Sink<T>>, scheduler: SchedulerRef) -> Box<dyn Disposable> {
        self.counts.subscribed.set(self.counts.subscribed.get() + 1);

        let t = scheduler.current_time();
        for value in &self.values {
            sink.event(t, value.clone());
        }
        sink.end(t);

        let released = Rc::clone(&self.counts.released);
        dispose_with(move || {
            released.set(released.get() + 1);
            Ok(())
        })
    }
}

/// Stream that never emits and whose handle fails to release
pub struct StuckStream {
    pub message: &'static str,
}

impl<T> Source<T> for StuckStream {
    fn run(&self, _sink: Rc<dyn Sink<T>>, _scheduler: SchedulerRef) -> Box<dyn Disposable> {
        let message = self.message;
        dispose_with(move || Err(StreamError::Source(message.to_string())))
    }
}

/// Stream that ends after `delay` but whose handle fails to release
pub struct LeakyStream {
    pub delay: Time,
    pub message: &'static str,
}

impl<T: 'static> Source<T> for LeakyStream {
    fn run(&self, sink: Rc<dyn Sink<T>>, scheduler: SchedulerRef) -> Box<dyn Disposable> {
        let mut ending = scheduler.delay(self.delay, Box::new(move |t| sink.end(t)));
        let message = self.message;
        dispose_with(move || {
            ending.dispose()?;
            Err(StreamError::Source(message.to_string()))
        })
    }
}

/// Sink that releases its own subscription after `limit` events
pub struct DisposingSink<T> {
    limit: usize,
    received: RefCell<Vec<Notification<T>>>,
    handle: RefCell<Option<Box<dyn Disposable>>>,
    pub dispose_result: RefCell<Option<Result<(), StreamError>>>,
}

impl<T> DisposingSink<T> {
    pub fn new(limit: usize) -> Rc<Self> {
        Rc::new(Self {
            limit,
            received: RefCell::new(Vec::new()),
            handle: RefCell::new(None),
            dispose_result: RefCell::new(None),
        })
    }

    pub fn hold(&self, handle: Box<dyn Disposable>) {
        *self.handle.borrow_mut() = Some(handle);
    }

    pub fn received(&self) -> Vec<Notification<T>>
    where
        T: Clone,
    {
        self.received.borrow().clone()
    }
}

impl<T> Sink<T> for DisposingSink<T> {
    fn event(&self, t: Time, value: T) {
        let count = {
            let mut received = self.received.borrow_mut();
            received.push(Notification::Event { time: t, value });
            received.len()
        };
        if count == self.limit {
            let handle = self.handle.borrow_mut().take();
            if let Some(mut handle) = handle {
                *self.dispose_result.borrow_mut() = Some(handle.dispose());
            }
        }
    }

    fn end(&self, t: Time) {
        self.received.borrow_mut().push(Notification::End { time: t });
    }

    fn error(&self, t: Time, err: StreamError) {
        self.received
            .borrow_mut()
            .push(Notification::Error { time: t, error: err });
    }
}
