// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for stream operations

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running or releasing streams
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum StreamError {
    /// The mapper failed to produce a child stream
    #[error("Mapper error: {0}")]
    Mapper(String),

    /// A producer signaled failure
    #[error("Source error: {0}")]
    Source(String),

    /// One or more resource handles failed to release
    #[error("Dispose error: {} handle(s) failed to release", .0.len())]
    Dispose(Vec<StreamError>),

    /// Concurrency bound must be at least one
    #[error("Invalid concurrency: {0} (must be at least 1)")]
    InvalidConcurrency(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

impl StreamError {
    /// Collapse a list of release failures into a single result
    ///
    /// An empty list is success, a single failure is returned as-is and
    /// anything more is wrapped in [`StreamError::Dispose`].
    pub fn aggregate(mut errors: Vec<StreamError>) -> StreamResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(StreamError::Dispose(errors)),
        }
    }
}
