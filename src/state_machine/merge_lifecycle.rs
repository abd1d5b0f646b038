// Copyright (c) 2025 - Cowboy AI, Inc.
//! Merge Lifecycle State Machine
//!
//! Phases of one concurrency-bounded merge.
//!
//! # State Machine Type
//!
//! This is a **Mealy Machine**: the output says which terminal notification,
//! if any, the transition sends downstream.
//!
//! # States
//!
//! - Active: source still running, children may be started
//! - Draining: source ended, waiting for running children
//! - Completed: source and every child ended (terminal, sent `end`)
//! - Failed: source, mapper or a child failed (terminal, sent `error`)
//! - Disposed: released by the subscriber (terminal, sends nothing)
//!
//! # Inputs
//!
//! - SourceEnded: Active → Draining
//! - ChildrenDrained: Draining → Completed
//! - Failed: Active | Draining → Failed
//! - Disposed: Active | Draining | Completed | Failed → Disposed
//!
//! ```text
//! Active ──SourceEnded──→ Draining ──ChildrenDrained──→ Completed
//!    │                       │
//!    └────────Failed─────────┴──→ Failed
//!
//! any (but Disposed) ──Disposed──→ Disposed
//! ```
//!
//! Completed and Failed are mutually exclusive: once either is reached no
//! other terminal output is ever produced.

use super::{StateMachine, TransitionError, TransitionResult};

/// Phase of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePhase {
    /// Source running
    #[default]
    Active,
    /// Source ended, children still running
    Draining,
    /// Everything ended
    Completed,
    /// A failure was forwarded
    Failed,
    /// Released by the subscriber
    Disposed,
}

/// Lifecycle input (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The outer source ended
    SourceEnded,
    /// The source has ended and no child is running
    ChildrenDrained,
    /// Source error, mapper failure, child error or release failure
    Failed,
    /// The subscriber released the merge
    Disposed,
}

/// Terminal notification a transition sends downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Send `end`
    End,
    /// Send `error`
    Error,
}

impl MergePhase {
    /// Whether notifications may still reach the downstream sink
    pub fn is_forwarding(&self) -> bool {
        matches!(self, MergePhase::Active | MergePhase::Draining)
    }

    /// Whether no further transition other than disposal is possible
    pub fn is_terminal(&self) -> bool {
        !self.is_forwarding()
    }
}

impl StateMachine for MergePhase {
    type Input = LifecycleSignal;
    type Output = Option<Terminal>;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use LifecycleSignal as L;
        use MergePhase as P;

        match (self, input) {
            (P::Active, L::SourceEnded) => Ok((P::Draining, None)),
            (P::Draining, L::ChildrenDrained) => Ok((P::Completed, Some(Terminal::End))),
            (P::Active | P::Draining, L::Failed) => Ok((P::Failed, Some(Terminal::Error))),
            (P::Active | P::Draining | P::Completed | P::Failed, L::Disposed) => {
                Ok((P::Disposed, None))
            }

            (P::Active, L::ChildrenDrained) => Err(TransitionError::PreconditionFailed(
                "Source has not ended".to_string(),
            )),
            (P::Draining, L::SourceEnded) => Err(TransitionError::InvalidTransition {
                from: "Draining".to_string(),
                to: "Draining (source ended twice)".to_string(),
            }),
            (P::Completed | P::Failed | P::Disposed, _) => Err(TransitionError::InvalidTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", input),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use LifecycleSignal as L;

        match self {
            MergePhase::Active => vec![L::SourceEnded, L::Failed, L::Disposed],
            MergePhase::Draining => vec![L::ChildrenDrained, L::Failed, L::Disposed],
            MergePhase::Completed | MergePhase::Failed => vec![L::Disposed],
            MergePhase::Disposed => Vec::new(),
        }
    }
}
