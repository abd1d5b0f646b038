// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Random arrival patterns are run through the merge on a virtual clock and
//! compared against a k-server FIFO queue model.

mod merge_properties;
