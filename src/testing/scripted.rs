// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scripted streams
//!
//! A [`ScriptedStream`] replays a fixed list of notifications. Each
//! notification's time is an offset from the moment of subscription, so the
//! same script means the same thing wherever it is started.

use std::cell::Cell;
use std::rc::Rc;

use crate::disposable::{dispose_all, dispose_with, Disposable};
use crate::errors::StreamError;
use crate::scheduler::SchedulerRef;
use crate::stream::{Notification, Sink, Source, Stream};
use crate::time::Time;

/// Counts subscriptions to and releases of a [`ScriptedStream`]
#[derive(Debug, Clone, Default)]
pub struct SubscriptionProbe {
    subscribed: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl SubscriptionProbe {
    /// How many times the stream was run
    pub fn subscriptions(&self) -> usize {
        self.subscribed.get()
    }

    /// How many subscription handles were released
    pub fn releases(&self) -> usize {
        self.released.get()
    }

    /// Subscriptions whose handle has not been released yet
    pub fn open(&self) -> usize {
        self.subscriptions() - self.releases()
    }
}

/// Stream replaying a fixed script of notifications
pub struct ScriptedStream<T> {
    script: Vec<Notification<T>>,
    probe: SubscriptionProbe,
}

impl<T: Clone + 'static> ScriptedStream<T> {
    /// Replay `script`; times are offsets from subscription
    pub fn new(script: Vec<Notification<T>>) -> Self {
        Self {
            script,
            probe: SubscriptionProbe::default(),
        }
    }

    /// Emit `value` after `delay`, then end at the same time
    pub fn delayed(delay: Time, value: T) -> Self {
        Self::new(vec![
            Notification::Event { time: delay, value },
            Notification::End { time: delay },
        ])
    }

    /// Fail with `error` after `delay`
    pub fn failing(delay: Time, error: StreamError) -> Self {
        Self::new(vec![Notification::Error { time: delay, error }])
    }

    /// Probe shared with every subscription of this stream
    pub fn probe(&self) -> SubscriptionProbe {
        self.probe.clone()
    }

    /// Wrap as a [`Stream`]
    pub fn into_stream(self) -> Stream<T> {
        Stream::from_source(self)
    }
}

impl<T: Clone + 'static> Source<T> for ScriptedStream<T> {
    fn run(&self, sink: Rc<dyn Sink<T>>, scheduler: SchedulerRef) -> Box<dyn Disposable> {
        self.probe.subscribed.set(self.probe.subscribed.get() + 1);

        let tasks: Vec<Box<dyn Disposable>> = self
            .script
            .iter()
            .cloned()
            .map(|notification| {
                let sink = Rc::clone(&sink);
                let offset = notification.time();
                scheduler.delay(
                    offset,
                    Box::new(move |t| notification.at(t).deliver(&*sink)),
                )
            })
            .collect();

        let released = Rc::clone(&self.probe.released);
        dispose_with(move || {
            released.set(released.get() + 1);
            dispose_all(tasks)
        })
    }
}

/// Stream replaying `script`
pub fn timeline<T: Clone + 'static>(script: Vec<Notification<T>>) -> Stream<T> {
    ScriptedStream::new(script).into_stream()
}
