// Copyright (c) 2025 - Cowboy AI, Inc.
//! Time representation shared by streams and schedulers

/// Time in scheduler ticks
///
/// Absolute on the root scheduler, local (zero at subscription) on a
/// relative scheduler view.
pub type Time = i64;

/// A value occurring at a specific point in time
pub type Occurrence<T> = (Time, T);
