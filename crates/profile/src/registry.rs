// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Lock-guarded key to statistics map
//!
//! [`TimerRegistry`] is the storage behind the process-wide
//! [`ProfilerAggregator`](crate::ProfilerAggregator). Every read and write
//! goes through a single mutex, so concurrent reports never lose updates and
//! a snapshot always reflects one serialization point.
//!
//! # Example
//!
//! ```rust
//! use cu_profile::TimerRegistry;
//!
//! let registry = TimerRegistry::new();
//! registry.record_timer("parse: lib.rs, 10 - parse", 1_200);
//! registry.record_timer("parse: lib.rs, 10 - parse", 800);
//!
//! let filtered = registry.snapshot_filtered(["parse"]);
//! assert_eq!(filtered["parse"].activation_count, 2);
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::result::TimerResult;

/// Snapshot of every key's statistics, ordered by key
pub type TimerResults = BTreeMap<String, TimerResult>;

/// Thread-safe registry of timing statistics
#[derive(Debug, Default)]
pub struct TimerRegistry {
    results: Mutex<TimerResults>,
}

impl TimerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while the lock is held can only come from `TimerResult::record`
    // rejecting its input, which it does before touching any field, so the
    // map is still consistent and the poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, TimerResults> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accumulate `duration_ns` under `key`
    ///
    /// The entry is created on first use.
    ///
    /// # Panics
    ///
    /// Panics if `duration_ns` is negative or the key's totals would
    /// overflow; the stored entry is left unchanged.
    pub fn record_timer(&self, key: &str, duration_ns: i64) {
        let mut results = self.lock();
        match results.get_mut(key) {
            Some(result) => result.record(duration_ns),
            None => {
                let mut result = TimerResult::new();
                result.record(duration_ns);
                results.insert(key.to_string(), result);
            }
        }
    }

    /// Independent copy of all current results
    pub fn snapshot(&self) -> TimerResults {
        self.lock().clone()
    }

    /// Results selected by key prefix and re-keyed by the filter string
    ///
    /// For each filter entry, in order, the first recorded key (in ascending
    /// key order) that starts with it is copied into the output under the
    /// filter string itself. Filter entries matching nothing are skipped with
    /// an informational log event; a repeated filter string simply overwrites
    /// its own slot.
    pub fn snapshot_filtered<I, S>(&self, filter: I) -> TimerResults
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let all_results = self.snapshot();
        let mut filtered = TimerResults::new();

        for key in filter {
            let key = key.as_ref();
            match first_with_prefix(&all_results, key) {
                Some(result) => {
                    filtered.insert(key.to_string(), *result);
                }
                None => {
                    info!(key, "Key not found in timer results");
                }
            }
        }

        filtered
    }

    /// Number of distinct keys recorded so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render the report text for the current contents
    ///
    /// Returns `None` when the registry is empty and `report_empty` is false.
    pub fn render_report(&self, header: &str, precision: usize, report_empty: bool) -> Option<String> {
        let results = self.snapshot();
        if results.is_empty() && !report_empty {
            return None;
        }

        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(out, "{header}");
        for (key, result) in &results {
            let _ = writeln!(out, "{key}:");
            let _ = result.write_summary(&mut out, precision);
        }
        Some(out)
    }
}

// Keys are ordered, so every key with `prefix` sorts at or after `prefix`
// and the first one found from there is the smallest match.
fn first_with_prefix<'a>(results: &'a TimerResults, prefix: &str) -> Option<&'a TimerResult> {
    results
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .next()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(_, result)| result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;

    #[test]
    fn test_record_creates_and_updates() {
        let registry = TimerRegistry::new();
        assert!(registry.is_empty());

        registry.record_timer("X", 100);
        registry.record_timer("X", 200);
        registry.record_timer("X", 300);

        let snapshot = registry.snapshot();
        let x = &snapshot["X"];
        assert_eq!(x.activation_count, 3);
        assert_eq!(x.total_duration_ns, 600);
        assert_eq!(x.min_duration_ns, 100);
        assert_eq!(x.max_duration_ns, 300);
        assert_eq!(x.average_ns(), 200);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let registry = TimerRegistry::new();
        registry.record_timer("k", 10);

        let before = registry.snapshot();
        registry.record_timer("k", 20);
        registry.record_timer("other", 5);

        assert_eq!(before.len(), 1);
        assert_eq!(before["k"].activation_count, 1);
        assert_eq!(before["k"].total_duration_ns, 10);
        assert_eq!(registry.snapshot()["k"].activation_count, 2);
    }

    #[test]
    fn test_filtered_snapshot_prefix_match() {
        let registry = TimerRegistry::new();
        registry.record_timer("A: file1, 10 - f", 7);
        registry.record_timer("B: file1, 20 - f", 9);

        let filtered = registry.snapshot_filtered(["A", "C"]);

        assert_eq!(filtered.len(), 1);
        assert!(!filtered.contains_key("C"));
        assert_eq!(filtered["A"], registry.snapshot()["A: file1, 10 - f"]);
    }

    #[test]
    fn test_filtered_snapshot_picks_smallest_match() {
        let registry = TimerRegistry::new();
        registry.record_timer("case1: f.rs, 3 - g", 1);
        registry.record_timer("case0: f.rs, 3 - g", 2);
        registry.record_timer("cas", 3);

        let filtered = registry.snapshot_filtered(["case"]);
        assert_eq!(filtered["case"].total_duration_ns, 2);
    }

    #[test]
    fn test_filtered_snapshot_logs_missing_key() {
        let registry = TimerRegistry::new();
        registry.record_timer("present: f.rs, 1 - g", 1);

        let logs = capture_logs(|| {
            let filtered = registry.snapshot_filtered(["present", "nothing"]);
            assert_eq!(filtered.len(), 1);
        });

        assert!(logs.contains("Key not found in timer results"));
        assert!(logs.contains("key=\"nothing\""));
        assert!(!logs.contains("key=\"present\""));
    }

    #[test]
    fn test_filtered_snapshot_is_literal_prefix() {
        let registry = TimerRegistry::new();
        registry.record_timer("xA: f.rs, 1 - g", 1);

        // "A" is contained but is not a prefix
        assert!(registry.snapshot_filtered(["A"]).is_empty());
    }

    #[test]
    fn test_filtered_snapshot_duplicate_filters() {
        let registry = TimerRegistry::new();
        registry.record_timer("A: f.rs, 1 - g", 4);

        let filtered = registry.snapshot_filtered(vec!["A".to_string(), "A".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["A"].activation_count, 1);
    }

    #[test]
    fn test_filtered_snapshot_empty_filter() {
        let registry = TimerRegistry::new();
        registry.record_timer("A", 1);

        let filtered = registry.snapshot_filtered(Vec::<String>::new());
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_render_report_sorted() {
        let registry = TimerRegistry::new();
        registry.record_timer("b", 2_000);
        registry.record_timer("a", 10);

        let report = registry.render_report("Profiler results:", 3, true).unwrap();
        let expected = "Profiler results:\n\
            a:\n\
            \tminimum duration = 10 ns\n\
            \tmaximum duration = 10 ns\n\
            \taverage duration = 10 ns\n\
            \tactivations count = 1\n\
            \ttotal = 10 ns\n\
            b:\n\
            \tminimum duration = 2.000 µs\n\
            \tmaximum duration = 2.000 µs\n\
            \taverage duration = 2.000 µs\n\
            \tactivations count = 1\n\
            \ttotal = 2.000 µs\n";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_render_report_empty() {
        let registry = TimerRegistry::new();
        assert_eq!(
            registry.render_report("Timings:", 3, true).as_deref(),
            Some("Timings:\n")
        );
        assert!(registry.render_report("Timings:", 3, false).is_none());
    }

    #[test]
    fn test_negative_duration_keeps_registry_usable() {
        let registry = TimerRegistry::new();
        registry.record_timer("k", 1);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.record_timer("k", -1);
        }));
        assert!(outcome.is_err());

        registry.record_timer("k", 2);
        assert_eq!(registry.snapshot()["k"].activation_count, 2);
    }

    #[test]
    fn test_overflowing_total_keeps_entry_consistent() {
        let registry = TimerRegistry::new();
        registry.record_timer("k", i64::MAX);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.record_timer("k", 1);
        }));
        assert!(outcome.is_err());

        let result = registry.snapshot()["k"];
        assert_eq!(result.activation_count, 1);
        assert_eq!(result.total_duration_ns, i64::MAX);
        assert_eq!(result.min_duration_ns, i64::MAX);
        assert_eq!(result.max_duration_ns, i64::MAX);

        registry.record_timer("other", 5);
        assert_eq!(registry.snapshot()["other"].activation_count, 1);
    }
}
