// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration for concurrency-bounded merges

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::errors::{StreamError, StreamResult};

/// Environment variable read by [`MergeConfig::from_env`]
pub const CONCURRENCY_VAR: &str = "MERGE_CONCURRENCY";

/// Configuration for one merge operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Maximum number of child streams running at once
    pub concurrency: NonZeroUsize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
        }
    }
}

impl MergeConfig {
    /// Create a configuration, rejecting a bound of zero
    pub fn new(concurrency: usize) -> StreamResult<Self> {
        let concurrency =
            NonZeroUsize::new(concurrency).ok_or(StreamError::InvalidConcurrency(concurrency))?;
        Ok(Self { concurrency })
    }

    /// Concurrency bound as a plain count
    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }

    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to [`MergeConfig::default`].
    pub fn from_env() -> StreamResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> StreamResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(CONCURRENCY_VAR) {
            Some(raw) => {
                let concurrency: usize = raw.trim().parse().map_err(|e| {
                    StreamError::Configuration(format!("{}={:?}: {}", CONCURRENCY_VAR, raw, e))
                })?;
                Self::new(concurrency)
            }
            None => Ok(Self::default()),
        }
    }
}
