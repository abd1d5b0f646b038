// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deterministic Collaborators
//!
//! Everything needed to drive streams without a wall clock:
//!
//! - [`VirtualScheduler`] - virtual time, advanced explicitly
//! - [`ScriptedStream`] / [`timeline`] - streams that replay fixed
//!   notifications at local times and report how often they were
//!   subscribed and released
//! - [`RecordingSink`] - collects everything it receives
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_frp_merge::testing::*;
//! use cim_frp_merge::Notification;
//!
//! let scheduler = VirtualScheduler::new();
//! let sink = RecordingSink::new();
//! let stream = timeline(vec![
//!     Notification::Event { time: 5, value: "a" },
//!     Notification::End { time: 5 },
//! ]);
//!
//! let _handle = stream.run(sink.clone(), scheduler.handle());
//! scheduler.run();
//! assert_eq!(sink.occurrences(), vec![(5, "a")]);
//! ```

pub mod recording;
pub mod scripted;
pub mod virtual_scheduler;

pub use recording::RecordingSink;
pub use scripted::{timeline, ScriptedStream, SubscriptionProbe};
pub use virtual_scheduler::VirtualScheduler;
