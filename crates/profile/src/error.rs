// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for profiler operations

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for profiler operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while configuring or reporting from the profiler
///
/// Contract violations (negative durations) are not represented here; they
/// panic at the call site.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The process-wide aggregator was already constructed
    #[error("Profiler aggregator is already initialized")]
    AlreadyInitialized,

    /// Configuration failed to load or validate
    #[error("Invalid profiler configuration: {0}")]
    Config(#[from] ConfigError),

    /// Writing a report failed
    #[error("Failed to write profiler report: {0}")]
    Io(#[from] std::io::Error),
}
