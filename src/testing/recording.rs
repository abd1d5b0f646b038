// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sink that records everything it receives

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::StreamError;
use crate::stream::{Notification, Sink};
use crate::time::{Occurrence, Time};

/// Sink collecting notifications in arrival order
pub struct RecordingSink<T> {
    notifications: RefCell<Vec<Notification<T>>>,
}

impl<T> RecordingSink<T> {
    /// Create an empty recorder
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            notifications: RefCell::new(Vec::new()),
        })
    }

    /// Number of `end`/`error` notifications received
    pub fn terminal_count(&self) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|n| n.is_terminal())
            .count()
    }

    /// Time of the `end` notification, if one arrived
    pub fn ended_at(&self) -> Option<Time> {
        self.notifications.borrow().iter().find_map(|n| match n {
            Notification::End { time } => Some(*time),
            _ => None,
        })
    }

    /// The `error` notification, if one arrived
    pub fn error(&self) -> Option<(Time, StreamError)> {
        self.notifications.borrow().iter().find_map(|n| match n {
            Notification::Error { time, error } => Some((*time, error.clone())),
            _ => None,
        })
    }

    /// Whether nothing has been received
    pub fn is_empty(&self) -> bool {
        self.notifications.borrow().is_empty()
    }
}

impl<T: Clone> RecordingSink<T> {
    /// Everything received so far
    pub fn notifications(&self) -> Vec<Notification<T>> {
        self.notifications.borrow().clone()
    }

    /// Events received so far, as (time, value) pairs
    pub fn occurrences(&self) -> Vec<Occurrence<T>> {
        self.notifications
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Event { time, value } => Some((*time, value.clone())),
                _ => None,
            })
            .collect()
    }
}

impl<T> Sink<T> for RecordingSink<T> {
    fn event(&self, t: Time, value: T) {
        self.notifications
            .borrow_mut()
            .push(Notification::Event { time: t, value });
    }

    fn end(&self, t: Time) {
        self.notifications
            .borrow_mut()
            .push(Notification::End { time: t });
    }

    fn error(&self, t: Time, err: StreamError) {
        self.notifications
            .borrow_mut()
            .push(Notification::Error { time: t, error: err });
    }
}
