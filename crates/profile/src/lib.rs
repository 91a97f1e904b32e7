// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # cu-profile - block-scoped timing aggregation
//!
//! Lightweight instrumentation for measuring how long code blocks take,
//! aggregated per call site across the whole process.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────┐   stop / drop   ┌──────────────────────────┐
//! │  ScopedTimer         │ ──────────────→ │  ProfilerAggregator      │
//! │  (one per block run) │  (key, ns)      │  Mutex<key → TimerResult>│
//! └──────────────────────┘                 └────────────┬─────────────┘
//!                                                       │ snapshot / report
//!                                                       ↓
//!                                          full or prefix-filtered copy,
//!                                          shutdown report to the sink
//! ```
//!
//! - [`TimerResult`]: count, total, min and max for one key
//! - [`TimerRegistry`]: the lock-guarded map of keys to results
//! - [`ProfilerAggregator`]: the single process-wide registry and its report
//! - [`ScopedTimer`]: measures one block and reports exactly once
//!
//! ## Usage
//!
//! ```rust
//! use cu_profile::{profile_checkblock, profile_results, stop_checkblock, use_profile};
//!
//! fn step() {
//!     profile_checkblock!();
//!     // measured until the end of `step`
//! }
//!
//! fn main() {
//!     use_profile!();
//!
//!     profile_checkblock!(warmup);
//!     step();
//!     stop_checkblock!(warmup);
//!
//!     for i in 0..2 {
//!         profile_checkblock!(iteration, format!("case{i}"));
//!         step();
//!     }
//!
//!     let results = profile_results!(["warmup", "case0", "case1"]);
//!     assert_eq!(results.len(), 3);
//! } // the report is printed here
//! ```
//!
//! Keys have the form `<label>: <file>, <line> - <function>`; anonymous
//! timers have no label.
//!
//! ## Feature flags
//!
//! - `profiling` (default): the macros expand to timers. Without it they
//!   compile to nothing and `profile_results!` returns an empty map.
//!
//! ## Configuration
//!
//! See [`ProfilerConfig`]. The report goes to stdout unless configured
//! otherwise through [`ProfilerAggregator::setup_with`].

pub mod aggregator;
pub mod config;
pub mod error;
pub mod registry;
pub mod result;
pub mod timer;
pub mod units;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use aggregator::{ProfileGuard, ProfilerAggregator};
pub use config::{ConfigError, ProfilerConfig, ReportSink};
pub use error::{ProfileError, ProfileResult};
pub use registry::{TimerRegistry, TimerResults};
pub use result::TimerResult;
pub use timer::{ScopedTimer, compose_identifier};
#[doc(hidden)]
pub use timer::enclosing_function;
pub use units::{TimeUnit, scale_duration_ns};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
