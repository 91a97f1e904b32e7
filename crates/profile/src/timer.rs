// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Scoped timing utilities
//!
//! # Example
//!
//! ```rust
//! use cu_profile::{ProfilerAggregator, ScopedTimer};
//!
//! {
//!     let _timer = ScopedTimer::new("load: ", file!(), line!(), "main");
//!     // ... do work ...
//! } // elapsed time is reported here
//!
//! let results = ProfilerAggregator::global().snapshot_filtered(["load"]);
//! assert_eq!(results["load"].activation_count, 1);
//! ```

use std::time::{Duration, Instant};

use crate::aggregator::ProfilerAggregator;
use crate::registry::TimerRegistry;

/// A scoped timer that reports its elapsed time exactly once
///
/// The start time is taken from the monotonic clock at construction. The
/// duration is reported on the first [`stop`](Self::stop), or on drop if the
/// timer was never stopped. Use the `profile_checkblock!` macro to fill in
/// the call site automatically.
///
/// The type is deliberately neither `Clone` nor `Copy`: one timer is one
/// measurement.
#[derive(Debug)]
pub struct ScopedTimer<'r> {
    identifier: String,
    start: Instant,
    stopped: bool,
    registry: &'r TimerRegistry,
}

impl ScopedTimer<'static> {
    /// Create a timer reporting to the process-wide aggregator
    ///
    /// The identifier is `label_prefix + file + ", " + line + " - " + function`.
    pub fn new(label_prefix: &str, file: &str, line: u32, function: &str) -> Self {
        Self::with_registry(
            ProfilerAggregator::global().registry(),
            label_prefix,
            file,
            line,
            function,
        )
    }
}

impl<'r> ScopedTimer<'r> {
    /// Create a timer reporting to `registry` instead of the global one
    pub fn with_registry(
        registry: &'r TimerRegistry,
        label_prefix: &str,
        file: &str,
        line: u32,
        function: &str,
    ) -> Self {
        let identifier = compose_identifier(label_prefix, file, line, function);
        Self {
            identifier,
            start: Instant::now(),
            stopped: false,
            registry,
        }
    }

    /// Key this timer reports under
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether the duration has already been reported
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Time since construction
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and report the elapsed time
    ///
    /// Calls after the first one do nothing.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }

        let elapsed_ns = i64::try_from(self.start.elapsed().as_nanos()).unwrap_or(i64::MAX);
        self.stopped = true;

        self.registry.record_timer(&self.identifier, elapsed_ns);
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Build the aggregation key for a call site
pub fn compose_identifier(label_prefix: &str, file: &str, line: u32, function: &str) -> String {
    format!("{label_prefix}{file}, {line} - {function}")
}

/// Reduce the type name produced by `function_name!()` to the function name
///
/// Drops the marker item, any closure segments, and the module path.
#[doc(hidden)]
pub fn enclosing_function(marker_path: &'static str) -> &'static str {
    let mut path = marker_path
        .rsplit_once("::")
        .map_or(marker_path, |(head, _marker)| head);
    while let Some(head) = path.strip_suffix("::{{closure}}") {
        path = head;
    }
    path.rsplit_once("::").map_or(path, |(_, name)| name)
}

/// Name of the enclosing function
///
/// ```rust
/// fn compute() -> &'static str {
///     cu_profile::function_name!()
/// }
/// assert_eq!(compute(), "compute");
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __cu_marker() {}
        fn __cu_type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::enclosing_function(__cu_type_name_of(__cu_marker))
    }};
}

/// Enable the shutdown report for the rest of the enclosing scope
///
/// Binds a [`ProfileGuard`](crate::ProfileGuard) to a hidden local; the
/// report is emitted when the scope (normally `main`) ends.
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! use_profile {
    () => {
        let _cu_profile_guard = $crate::ProfilerAggregator::activate();
    };
}

/// Time the rest of the enclosing block
///
/// - `profile_checkblock!()` creates an anonymous timer that cannot be
///   stopped early.
/// - `profile_checkblock!(name)` creates a timer bound to `name` with the
///   label `"name: "`; stop it early with `stop_checkblock!(name)`.
/// - `profile_checkblock!(name, key)` labels the timer with `key` (any
///   `Display` value) instead, so one call site can report under several
///   keys.
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! profile_checkblock {
    () => {
        let _cu_checkblock_timer =
            $crate::ScopedTimer::new("", file!(), line!(), $crate::function_name!());
    };
    ($name:ident) => {
        #[allow(unused_mut)]
        let mut $name = $crate::ScopedTimer::new(
            concat!(stringify!($name), ": "),
            file!(),
            line!(),
            $crate::function_name!(),
        );
    };
    ($name:ident, $key:expr) => {
        #[allow(unused_mut)]
        let mut $name = $crate::ScopedTimer::new(
            &format!("{}: ", $key),
            file!(),
            line!(),
            $crate::function_name!(),
        );
    };
}

/// Stop a timer created by `profile_checkblock!(name)` before its scope ends
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! stop_checkblock {
    ($name:ident) => {
        $name.stop()
    };
}

/// Current results, optionally filtered by key prefixes
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! profile_results {
    () => {
        $crate::ProfilerAggregator::global().snapshot()
    };
    ($filter:expr) => {
        $crate::ProfilerAggregator::global().snapshot_filtered($filter)
    };
}

// Profiling disabled: the hooks compile to nothing

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! use_profile {
    () => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_checkblock {
    ($($args:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! stop_checkblock {
    ($name:ident) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_results {
    () => {
        $crate::TimerResults::new()
    };
    ($filter:expr) => {{
        let _ = &$filter;
        $crate::TimerResults::new()
    }};
}
