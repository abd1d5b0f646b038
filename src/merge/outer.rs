// Copyright (c) 2025 - Cowboy AI, Inc.
//! Multiplexer
//!
//! Listens to the outer source and, through [`Inner`] adapters, to every
//! child. Owns the outer subscription, the running children and the backlog
//! of values waiting for a free slot. It is the only thing that sends
//! terminal notifications downstream.
//!
//! # Single-writer discipline
//!
//! `state` is borrowed only for the duration of a bookkeeping step and never
//! across a call into a mapper, a stream, a handle or a sink. Any of those may
//! call straight back into the multiplexer.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::inner::{ChildId, Inner};
use super::Mapper;
use crate::disposable::{try_dispose, Disposable};
use crate::errors::{StreamError, StreamResult};
use crate::scheduler::{run_relative, SchedulerRef};
use crate::state_machine::{LifecycleSignal, MergePhase, StateInvariant, StateMachine, Terminal};
use crate::stream::{Sink, Stream};
use crate::time::Time;

struct OuterState<T, U> {
    phase: MergePhase,
    concurrency: usize,
    pending: VecDeque<T>,
    current: BTreeMap<ChildId, Rc<Inner<T, U>>>,
    next_child: u64,
    source_handle: Option<Box<dyn Disposable>>,
}

impl<T, U> OuterState<T, U> {
    /// Apply a lifecycle signal, returning the terminal notification to send
    ///
    /// `None` from the outer option means the signal was rejected.
    fn signal(&mut self, signal: LifecycleSignal) -> Option<Option<Terminal>> {
        match self.phase.transition(&signal) {
            Ok((next, output)) => {
                self.phase = next;
                debug_assert_eq!(self.check_invariants(), Ok(()));
                Some(output)
            }
            Err(err) => {
                trace!(phase = ?self.phase, ?signal, %err, "Ignoring lifecycle signal");
                None
            }
        }
    }

    fn allocate_child(&mut self) -> ChildId {
        let id = ChildId(self.next_child);
        self.next_child += 1;
        id
    }
}

impl<T, U> StateInvariant for OuterState<T, U> {
    fn check_invariants(&self) -> Result<(), String> {
        if self.current.len() > self.concurrency {
            return Err(format!(
                "{} children running with concurrency {}",
                self.current.len(),
                self.concurrency
            ));
        }
        match self.phase {
            MergePhase::Completed if !self.current.is_empty() || !self.pending.is_empty() => {
                Err("Completed with work outstanding".to_string())
            }
            MergePhase::Disposed if !self.current.is_empty() || !self.pending.is_empty() => {
                Err("Disposed with work outstanding".to_string())
            }
            MergePhase::Disposed | MergePhase::Completed if self.source_handle.is_some() => {
                Err("Source handle held after the source was released".to_string())
            }
            _ => Ok(()),
        }
    }
}

pub(crate) struct Outer<T, U> {
    mapper: Mapper<T, U>,
    sink: Rc<dyn Sink<U>>,
    scheduler: SchedulerRef,
    state: RefCell<OuterState<T, U>>,
    // Upgraded for each child adapter, which then keeps the merge alive.
    this: Weak<Outer<T, U>>,
}

impl<T: 'static, U: 'static> Outer<T, U> {
    /// Create the multiplexer and subscribe it to `source`
    pub(crate) fn run(
        mapper: Mapper<T, U>,
        concurrency: usize,
        source: &Stream<T>,
        sink: Rc<dyn Sink<U>>,
        scheduler: SchedulerRef,
    ) -> Rc<Self> {
        let outer = Rc::new_cyclic(|this| Outer {
            mapper,
            sink,
            scheduler,
            state: RefCell::new(OuterState {
                phase: MergePhase::Active,
                concurrency,
                pending: VecDeque::new(),
                current: BTreeMap::new(),
                next_child: 0,
                source_handle: None,
            }),
            this: this.clone(),
        });

        let listener: Rc<dyn Sink<T>> = outer.clone();
        let handle = source.run(listener, Rc::clone(&outer.scheduler));
        outer.attach_source(handle);

        debug!(concurrency, "Merge subscribed to source");
        outer
    }

    fn attach_source(&self, mut handle: Box<dyn Disposable>) {
        let mut state = self.state.borrow_mut();
        if state.phase == MergePhase::Active {
            state.source_handle = Some(handle);
            return;
        }
        // The source finished, or the merge was released, while subscribing.
        drop(state);
        if let Err(err) = handle.dispose() {
            warn!(error = %err, "Failed to release source handle after early termination");
        }
    }

    pub(crate) fn is_forwarding(&self) -> bool {
        self.state.borrow().phase.is_forwarding()
    }

    pub(crate) fn phase(&self) -> MergePhase {
        self.state.borrow().phase
    }

    /// Map `value` and run the resulting child from time `t`
    fn start(&self, t: Time, value: T) {
        let stream = match (self.mapper)(value) {
            Ok(stream) => stream,
            Err(err) => {
                debug!(time = t, error = %err, "Mapper failed");
                self.fail(t, err);
                return;
            }
        };
        let Some(outer) = self.this.upgrade() else {
            return;
        };

        let inner = {
            let mut state = self.state.borrow_mut();
            // The mapper may have failed or released the merge re-entrantly.
            if !state.phase.is_forwarding() {
                trace!(time = t, phase = ?state.phase, "Dropping child mapped after termination");
                return;
            }
            let id = state.allocate_child();
            let inner = Rc::new(Inner::new(id, t, outer, Rc::clone(&self.sink)));
            state.current.insert(id, Rc::clone(&inner));
            debug_assert_eq!(state.check_invariants(), Ok(()));
            debug!(time = t, child = %id, active = state.current.len(), "Started child stream");
            inner
        };

        let listener: Rc<dyn Sink<U>> = inner.clone();
        let handle = run_relative(t, Rc::clone(&self.scheduler), &stream, listener);
        if let Err(err) = inner.attach(handle) {
            warn!(time = t, child = %inner.id(), error = %err, "Failed to release child handle");
            self.fail(t, err);
        }
    }

    /// A child ended at absolute time `t`
    pub(crate) fn end_inner(&self, t: Time, id: ChildId) {
        let child = {
            let mut state = self.state.borrow_mut();
            match state.current.remove(&id) {
                Some(child) => child,
                None => {
                    trace!(time = t, child = %id, "Ignoring end from unknown child");
                    return;
                }
            }
        };
        debug!(time = t, child = %id, "Child stream ended");

        if let Err(err) = child.release() {
            warn!(time = t, child = %id, error = %err, "Failed to release child handle");
            self.fail(t, err);
        }

        let next = {
            let mut state = self.state.borrow_mut();
            if state.phase.is_forwarding() {
                state.pending.pop_front()
            } else {
                None
            }
        };

        match next {
            Some(value) => self.start(t, value),
            None => self.check_end(t),
        }
    }

    /// A child failed at absolute time `t`
    pub(crate) fn child_error(&self, t: Time, err: StreamError) {
        self.fail(t, err);
    }

    /// Forward a failure downstream, once
    ///
    /// Children still running are left to the subscriber's dispose.
    fn fail(&self, t: Time, err: StreamError) {
        let output = self.state.borrow_mut().signal(LifecycleSignal::Failed);
        if output == Some(Some(Terminal::Error)) {
            debug!(time = t, error = %err, "Merge failed");
            self.sink.error(t, err);
        }
    }

    fn check_end(&self, t: Time) {
        let output = {
            let mut state = self.state.borrow_mut();
            if state.phase != MergePhase::Draining
                || !state.current.is_empty()
                || !state.pending.is_empty()
            {
                return;
            }
            state.signal(LifecycleSignal::ChildrenDrained)
        };

        if output == Some(Some(Terminal::End)) {
            debug!(time = t, "Merge completed");
            self.sink.end(t);
        }
    }

    /// Release the source and every child; discard the backlog
    pub(crate) fn dispose(&self) -> StreamResult<()> {
        let (source, children, discarded) = {
            let mut state = self.state.borrow_mut();
            if state.phase == MergePhase::Disposed {
                return Ok(());
            }
            let discarded = state.pending.len();
            state.pending.clear();
            let source = state.source_handle.take();
            let children = std::mem::take(&mut state.current);
            state.signal(LifecycleSignal::Disposed);
            (source, children, discarded)
        };
        debug!(children = children.len(), discarded, "Disposing merge");

        let mut errors = Vec::new();
        if let Some(mut source) = source {
            errors.extend(source.dispose().err());
        }
        for child in children.into_values() {
            errors.extend(child.release().err());
        }
        StreamError::aggregate(errors)
    }
}

impl<T: 'static, U: 'static> Sink<T> for Outer<T, U> {
    fn event(&self, t: Time, value: T) {
        let mut state = self.state.borrow_mut();
        if state.phase != MergePhase::Active {
            trace!(time = t, phase = ?state.phase, "Ignoring source event");
            return;
        }
        if state.current.len() < state.concurrency {
            drop(state);
            self.start(t, value);
        } else {
            state.pending.push_back(value);
            trace!(time = t, backlog = state.pending.len(), "Queued value");
        }
    }

    fn end(&self, t: Time) {
        let handle = {
            let mut state = self.state.borrow_mut();
            if state.signal(LifecycleSignal::SourceEnded).is_none() {
                return;
            }
            state.source_handle.take()
        };
        debug!(time = t, "Source ended");

        if let Some(mut handle) = handle {
            try_dispose::<T>(t, &mut handle, self);
        }
        self.check_end(t);
    }

    fn error(&self, t: Time, err: StreamError) {
        self.fail(t, err);
    }
}
