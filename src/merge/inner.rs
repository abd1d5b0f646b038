// Copyright (c) 2025 - Cowboy AI, Inc.
//! Child adapter
//!
//! One adapter per started child stream. The child runs against a scheduler
//! view where its launch is time zero; the adapter adds `start_time` back to
//! every notification before passing it on. Values go straight to the
//! downstream sink, lifecycle notifications go to the multiplexer.
//!
//! An adapter owns its multiplexer. While a child is registered the two form
//! a cycle, so a merge whose source has finished stays alive on its running
//! children alone; the cycle is cut when the child is removed on end or
//! dispose.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::outer::Outer;
use crate::disposable::Disposable;
use crate::errors::{StreamError, StreamResult};
use crate::stream::Sink;
use crate::time::Time;

/// Stable key of a child within one merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildId(pub(crate) u64);

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "child-{}", self.0)
    }
}

/// Subscription handle of a child, across its short life
enum ChildHandle {
    /// The child stream is being run; no handle yet
    Starting,
    /// Running, handle held
    Running(Box<dyn Disposable>),
    /// Released; any handle arriving later is released on arrival
    Released,
}

pub(crate) struct Inner<T, U> {
    id: ChildId,
    start_time: Time,
    outer: Rc<Outer<T, U>>,
    sink: Rc<dyn Sink<U>>,
    handle: RefCell<ChildHandle>,
}

impl<T: 'static, U: 'static> Inner<T, U> {
    pub(crate) fn new(
        id: ChildId,
        start_time: Time,
        outer: Rc<Outer<T, U>>,
        sink: Rc<dyn Sink<U>>,
    ) -> Self {
        Self {
            id,
            start_time,
            outer,
            sink,
            handle: RefCell::new(ChildHandle::Starting),
        }
    }

    pub(crate) fn id(&self) -> ChildId {
        self.id
    }

    /// Store the handle returned by running the child stream
    ///
    /// If the child was released while it was being started, the handle is
    /// released right away.
    pub(crate) fn attach(&self, mut handle: Box<dyn Disposable>) -> StreamResult<()> {
        let mut slot = self.handle.borrow_mut();
        match *slot {
            ChildHandle::Starting => {
                *slot = ChildHandle::Running(handle);
                Ok(())
            }
            ChildHandle::Running(_) | ChildHandle::Released => {
                drop(slot);
                handle.dispose()
            }
        }
    }

    /// Release the child's subscription; idempotent
    pub(crate) fn release(&self) -> StreamResult<()> {
        let previous = std::mem::replace(&mut *self.handle.borrow_mut(), ChildHandle::Released);
        match previous {
            ChildHandle::Running(mut handle) => handle.dispose(),
            ChildHandle::Starting | ChildHandle::Released => Ok(()),
        }
    }

    fn is_released(&self) -> bool {
        matches!(*self.handle.borrow(), ChildHandle::Released)
    }
}

impl<T: 'static, U: 'static> Sink<U> for Inner<T, U> {
    fn event(&self, t: Time, value: U) {
        if self.outer.is_forwarding() && !self.is_released() {
            self.sink.event(t + self.start_time, value);
        }
    }

    fn end(&self, t: Time) {
        self.outer.end_inner(t + self.start_time, self.id);
    }

    fn error(&self, t: Time, err: StreamError) {
        self.outer.child_error(t + self.start_time, err);
    }
}
