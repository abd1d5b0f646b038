// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Handles
//!
//! Every running subscription hands back a [`Disposable`]. Releasing it stops
//! further notifications from that subscription. Releasing twice must be safe,
//! so the helpers here are all idempotent.
//!
//! # Helpers
//!
//! - [`dispose_with`] - release by running a closure once
//! - [`dispose_all`] - release a batch, aggregating failures
//! - [`try_dispose`] - release and report a failure to a sink

use tracing::warn;

use crate::errors::{StreamError, StreamResult};
use crate::stream::Sink;
use crate::time::Time;

/// A releasable resource
pub trait Disposable {
    /// Release the resource
    ///
    /// Must be safe to call more than once; calls after the first are no-ops.
    fn dispose(&mut self) -> StreamResult<()>;
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&mut self) -> StreamResult<()> {
        (**self).dispose()
    }
}

/// Handle released by running a closure exactly once
pub struct DisposeWith<F> {
    release: Option<F>,
}

impl<F> Disposable for DisposeWith<F>
where
    F: FnOnce() -> StreamResult<()>,
{
    fn dispose(&mut self) -> StreamResult<()> {
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

/// Create a handle that runs `release` the first time it is disposed
pub fn dispose_with<F>(release: F) -> Box<dyn Disposable>
where
    F: FnOnce() -> StreamResult<()> + 'static,
{
    Box::new(DisposeWith {
        release: Some(release),
    })
}

/// Release every handle, even if some fail
///
/// Failures are collected rather than short-circuiting; see
/// [`StreamError::aggregate`] for how they are reported.
pub fn dispose_all<I>(handles: I) -> StreamResult<()>
where
    I: IntoIterator<Item = Box<dyn Disposable>>,
{
    let errors: Vec<StreamError> = handles
        .into_iter()
        .filter_map(|mut handle| handle.dispose().err())
        .collect();

    StreamError::aggregate(errors)
}

/// Release a handle and forward any failure to `sink` as an error at `t`
pub fn try_dispose<T>(t: Time, disposable: &mut dyn Disposable, sink: &dyn Sink<T>) {
    if let Err(err) = disposable.dispose() {
        warn!(time = t, error = %err, "Failed to release handle");
        sink.error(t, err);
    }
}
