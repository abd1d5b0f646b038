// Copyright (c) 2025 - Cowboy AI, Inc.
//! Streams, Sources and Sinks
//!
//! A [`Stream<T>`] is a recipe for a time-ordered sequence of notifications.
//! Nothing happens until it is run against a [`Sink`] and a scheduler; running
//! returns a [`Disposable`] that stops the subscription.
//!
//! ```text
//! Time: ────────────────────────────→
//! Value:      ●       ●   ●       |
//!           event   event event  end
//! ```
//!
//! Each subscription delivers events in non-decreasing time order and ends
//! with at most one terminal notification (`end` or `error`).

use serde::Serialize;
use std::fmt;
use std::rc::Rc;

use crate::disposable::Disposable;
use crate::errors::StreamError;
use crate::scheduler::SchedulerRef;
use crate::time::Time;

/// Receiver of stream notifications
///
/// Methods take `&self`: a sink may be driven from several places at once
/// (the source, scheduled tasks, child adapters) on a single thread, so
/// implementations use interior mutability.
pub trait Sink<T> {
    /// A value occurred at `t`
    fn event(&self, t: Time, value: T);

    /// The stream ended normally at `t`
    fn end(&self, t: Time);

    /// The stream failed at `t`
    fn error(&self, t: Time, err: StreamError);
}

/// A producer that can be subscribed to
pub trait Source<T> {
    /// Subscribe `sink` and return the subscription's handle
    ///
    /// Times delivered to `sink` are in the frame of `scheduler`.
    fn run(&self, sink: Rc<dyn Sink<T>>, scheduler: SchedulerRef) -> Box<dyn Disposable>;
}

/// A runnable stream of `T`
///
/// `Empty` is the canonical empty producer. It is a plain marker so that
/// combinators can recognize it without subscribing.
pub enum Stream<T> {
    /// Never emits, ends immediately
    Empty,
    /// Any other producer
    Source(Rc<dyn Source<T>>),
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        match self {
            Stream::Empty => Stream::Empty,
            Stream::Source(source) => Stream::Source(Rc::clone(source)),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Empty => write!(f, "Stream::Empty"),
            Stream::Source(_) => write!(f, "Stream<{}>", std::any::type_name::<T>()),
        }
    }
}

impl<T: 'static> Stream<T> {
    /// The canonical empty stream
    pub fn empty() -> Self {
        Stream::Empty
    }

    /// Wrap a producer
    pub fn from_source<S>(source: S) -> Self
    where
        S: Source<T> + 'static,
    {
        Stream::Source(Rc::new(source))
    }

    /// Whether this is the canonical empty stream
    pub fn is_canonical_empty(&self) -> bool {
        matches!(self, Stream::Empty)
    }

    /// Subscribe `sink` to this stream
    ///
    /// The empty stream ends at the scheduler's current time on a scheduled
    /// task, never synchronously inside `run`.
    pub fn run(&self, sink: Rc<dyn Sink<T>>, scheduler: SchedulerRef) -> Box<dyn Disposable> {
        match self {
            Stream::Empty => scheduler.asap(Box::new(move |t| sink.end(t))),
            Stream::Source(source) => source.run(sink, scheduler),
        }
    }
}

/// A single notification, as recorded or scripted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification<T> {
    /// `event(time, value)`
    Event { time: Time, value: T },
    /// `end(time)`
    End { time: Time },
    /// `error(time, error)`
    Error { time: Time, error: StreamError },
}

impl<T> Notification<T> {
    /// Time the notification occurred
    pub fn time(&self) -> Time {
        match self {
            Notification::Event { time, .. }
            | Notification::End { time }
            | Notification::Error { time, .. } => *time,
        }
    }

    /// Whether this is `end` or `error`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Event { .. })
    }

    /// Same notification at a different time
    pub fn at(self, time: Time) -> Self {
        match self {
            Notification::Event { value, .. } => Notification::Event { time, value },
            Notification::End { .. } => Notification::End { time },
            Notification::Error { error, .. } => Notification::Error { time, error },
        }
    }

    /// Deliver to `sink` at the notification's own time
    pub fn deliver(self, sink: &dyn Sink<T>) {
        match self {
            Notification::Event { time, value } => sink.event(time, value),
            Notification::End { time } => sink.end(time),
            Notification::Error { time, error } => sink.error(time, error),
        }
    }
}
