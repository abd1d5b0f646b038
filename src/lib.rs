// Copyright (c) 2025 - Cowboy AI, Inc.
//! Concurrency-bounded stream flattening for the Composable Information Machine
//!
//! This crate maps each value of a time-stamped stream to a child stream and
//! merges the children into one output stream, running at most N of them at
//! once. Children run on their own local clock; the merge re-projects their
//! events onto the absolute timeline.
//!
//! Everything is single-threaded and push-based: sources call into sinks
//! synchronously, and a scheduler decides when deferred work runs.

pub mod config;
pub mod disposable;
pub mod errors;
pub mod merge;
pub mod scheduler;
pub mod state_machine;
pub mod stream;
pub mod testing;
pub mod time;

// Re-export commonly used types
pub use config::MergeConfig;
pub use disposable::Disposable;
pub use errors::{StreamError, StreamResult};
pub use merge::{
    concat_map, merge_concurrently, merge_map_concurrently, merge_map_with,
    try_merge_map_concurrently, MergeHandle,
};
pub use scheduler::{Scheduler, SchedulerRef};
pub use state_machine::MergePhase;
pub use stream::{Notification, Sink, Source, Stream};
pub use time::{Occurrence, Time};
