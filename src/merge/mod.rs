// Copyright (c) 2025 - Cowboy AI, Inc.
//! Concurrency-Bounded Merge
//!
//! Flattens a stream of values into one stream by mapping each value to a
//! child stream and running up to N children at once.
//!
//! ```text
//! source:   A B C                          (all at t = 0)
//! mapper:   A → ──────────────A|  (30)
//!           B → ────B|            (10)
//!           C →      ──C|         (5, queued until B ends)
//!
//! merged (N = 2):  ────B──C──────A|
//!                      10 15     30
//! ```
//!
//! # Semantics
//!
//! - At most N children run at any time; overflow values wait in a FIFO
//!   backlog and start, in arrival order, as slots free up.
//! - A child started at absolute time `t` runs on a scheduler view where
//!   `t` reads as zero; its events are re-projected to `t + local`.
//! - The merge ends once the source has ended and every child has ended.
//! - The first failure (source, mapper or child) is forwarded and no further
//!   values are started. Children still running are *not* released by the
//!   merge itself; dispose the subscription to release them.
//! - Two children emitting at the same absolute time are delivered in
//!   whatever order the scheduler runs them; that order is not part of the
//!   contract.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_frp_merge::merge::merge_map_concurrently;
//!
//! let merged = merge_map_concurrently(|x| fetch(x), 2, requests)?;
//! let handle = merged.run(sink, scheduler);
//! ```

mod inner;
mod outer;

pub use inner::ChildId;

use std::rc::Rc;

use crate::config::MergeConfig;
use crate::disposable::Disposable;
use crate::errors::{StreamError, StreamResult};
use crate::scheduler::SchedulerRef;
use crate::state_machine::MergePhase;
use crate::stream::{Sink, Source, Stream};

use outer::Outer;

/// Mapper as stored by a merge; `Err` is a mapper failure
pub(crate) type Mapper<T, U> = Rc<dyn Fn(T) -> StreamResult<Stream<U>>>;

/// Source that runs one multiplexer per subscription
pub struct MergeConcurrently<T, U> {
    mapper: Mapper<T, U>,
    config: MergeConfig,
    source: Stream<T>,
}

impl<T: 'static, U: 'static> MergeConcurrently<T, U> {
    /// Subscribe, keeping the concrete handle
    pub fn subscribe(&self, sink: Rc<dyn Sink<U>>, scheduler: SchedulerRef) -> MergeHandle<T, U> {
        MergeHandle {
            outer: Outer::run(
                Rc::clone(&self.mapper),
                self.config.concurrency(),
                &self.source,
                sink,
                scheduler,
            ),
        }
    }
}

impl<T: 'static, U: 'static> Source<U> for MergeConcurrently<T, U> {
    fn run(&self, sink: Rc<dyn Sink<U>>, scheduler: SchedulerRef) -> Box<dyn Disposable> {
        Box::new(self.subscribe(sink, scheduler))
    }
}

/// Handle of one running merge
///
/// Dropping the handle does not stop the merge: like any other stream it runs
/// to its terminal notification, kept alive by its source and running
/// children. Call [`Disposable::dispose`] to stop it early.
pub struct MergeHandle<T, U> {
    outer: Rc<Outer<T, U>>,
}

impl<T: 'static, U: 'static> MergeHandle<T, U> {
    /// Current lifecycle phase
    pub fn phase(&self) -> MergePhase {
        self.outer.phase()
    }
}

impl<T: 'static, U: 'static> Disposable for MergeHandle<T, U> {
    /// Release the source and every running child, discarding the backlog
    ///
    /// Every handle is released even if some fail; failures come back
    /// aggregated.
    fn dispose(&mut self) -> StreamResult<()> {
        self.outer.dispose()
    }
}

/// Merge with a prebuilt configuration and a fallible mapper
///
/// A canonical empty `stream` yields the canonical empty stream without
/// building anything.
pub fn merge_map_with<T, U, F>(config: MergeConfig, mapper: F, stream: Stream<T>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> StreamResult<Stream<U>> + 'static,
{
    if stream.is_canonical_empty() {
        return Stream::empty();
    }

    Stream::from_source(MergeConcurrently {
        mapper: Rc::new(mapper),
        config,
        source: stream,
    })
}

/// Map each value to a stream, running at most `concurrency` at once
///
/// # Errors
///
/// Returns [`StreamError::InvalidConcurrency`] when `concurrency` is zero.
pub fn merge_map_concurrently<T, U, F>(
    mapper: F,
    concurrency: usize,
    stream: Stream<T>,
) -> StreamResult<Stream<U>>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> Stream<U> + 'static,
{
    let config = MergeConfig::new(concurrency)?;
    Ok(merge_map_with(config, move |value| Ok(mapper(value)), stream))
}

/// Like [`merge_map_concurrently`], with a mapper that may fail
///
/// A mapper failure is forwarded downstream as an error at the time the
/// value was about to start.
///
/// # Errors
///
/// Returns [`StreamError::InvalidConcurrency`] when `concurrency` is zero.
pub fn try_merge_map_concurrently<T, U, E, F>(
    mapper: F,
    concurrency: usize,
    stream: Stream<T>,
) -> StreamResult<Stream<U>>
where
    T: 'static,
    U: 'static,
    E: Into<StreamError>,
    F: Fn(T) -> Result<Stream<U>, E> + 'static,
{
    let config = MergeConfig::new(concurrency)?;
    Ok(merge_map_with(
        config,
        move |value| mapper(value).map_err(Into::into),
        stream,
    ))
}

/// Flatten a stream of streams, running at most `concurrency` at once
///
/// # Errors
///
/// Returns [`StreamError::InvalidConcurrency`] when `concurrency` is zero.
pub fn merge_concurrently<T: 'static>(
    concurrency: usize,
    streams: Stream<Stream<T>>,
) -> StreamResult<Stream<T>> {
    merge_map_concurrently(|stream| stream, concurrency, streams)
}

/// Map each value to a stream and run them strictly one after another
pub fn concat_map<T, U, F>(mapper: F, stream: Stream<T>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> Stream<U> + 'static,
{
    merge_map_with(MergeConfig::default(), move |value| Ok(mapper(value)), stream)
}
