// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Per-key timing statistics
//!
//! A [`TimerResult`] accumulates count, total, min and max for every
//! activation reported under one key. It is a plain value type; the
//! [`TimerRegistry`](crate::TimerRegistry) serializes access to it.

use std::fmt;

use serde::Serialize;

use crate::units::scale_duration_ns;

/// Fractional digits used by the `Display` impl
const DISPLAY_PRECISION: usize = 3;

/// Statistics accumulated for a single timer key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerResult {
    /// Number of completed timers that reported to this key
    pub activation_count: i64,
    /// Sum of all reported durations in nanoseconds
    pub total_duration_ns: i64,
    /// Smallest reported duration; `i64::MAX` until the first sample
    pub min_duration_ns: i64,
    /// Largest reported duration; `-1` until the first sample
    pub max_duration_ns: i64,
}

impl Default for TimerResult {
    fn default() -> Self {
        Self {
            activation_count: 0,
            total_duration_ns: 0,
            min_duration_ns: i64::MAX,
            max_duration_ns: -1,
        }
    }
}

impl TimerResult {
    /// Create an empty result with the "no samples" sentinels
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one observed duration
    ///
    /// # Panics
    ///
    /// Panics if `duration_ns` is negative, or if the count or total would
    /// overflow. A negative duration means a broken clock or call pattern
    /// and is never clamped. Both checks run before any field changes.
    pub fn record(&mut self, duration_ns: i64) {
        assert!(
            duration_ns >= 0,
            "timer duration must be non-negative, got {duration_ns}"
        );
        let total = self.total_duration_ns.checked_add(duration_ns);
        let count = self.activation_count.checked_add(1);
        let (Some(total), Some(count)) = (total, count) else {
            panic!(
                "timer totals overflow: {} activations, {} ns total, adding {duration_ns} ns",
                self.activation_count, self.total_duration_ns
            );
        };

        self.activation_count = count;
        self.total_duration_ns = total;
        self.min_duration_ns = self.min_duration_ns.min(duration_ns);
        self.max_duration_ns = self.max_duration_ns.max(duration_ns);
    }

    /// Mean duration, truncated toward zero; `0` when nothing was recorded
    pub fn average_ns(&self) -> i64 {
        if self.activation_count == 0 {
            return 0;
        }
        self.total_duration_ns / self.activation_count
    }

    /// Whether at least one activation has been recorded
    pub fn has_samples(&self) -> bool {
        self.activation_count > 0
    }

    /// Write the indented report block for this result
    ///
    /// Each line is prefixed by a tab so the block nests under its key.
    pub fn write_summary<W: fmt::Write>(&self, out: &mut W, precision: usize) -> fmt::Result {
        if !self.has_samples() {
            return writeln!(out, "\tno activations recorded");
        }

        writeln!(
            out,
            "\tminimum duration = {}",
            scale_duration_ns(self.min_duration_ns, precision)
        )?;
        writeln!(
            out,
            "\tmaximum duration = {}",
            scale_duration_ns(self.max_duration_ns, precision)
        )?;
        writeln!(
            out,
            "\taverage duration = {}",
            scale_duration_ns(self.average_ns(), precision)
        )?;
        writeln!(out, "\tactivations count = {}", self.activation_count)?;
        writeln!(
            out,
            "\ttotal = {}",
            scale_duration_ns(self.total_duration_ns, precision)
        )
    }
}

impl fmt::Display for TimerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_summary(f, DISPLAY_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sentinels() {
        let result = TimerResult::new();

        assert_eq!(result.activation_count, 0);
        assert_eq!(result.total_duration_ns, 0);
        assert_eq!(result.min_duration_ns, i64::MAX);
        assert_eq!(result.max_duration_ns, -1);
        assert_eq!(result.average_ns(), 0);
        assert!(!result.has_samples());
    }

    #[test]
    fn test_record_accumulates() {
        let mut result = TimerResult::new();
        for d in [100, 200, 300] {
            result.record(d);
        }

        assert_eq!(result.activation_count, 3);
        assert_eq!(result.total_duration_ns, 600);
        assert_eq!(result.min_duration_ns, 100);
        assert_eq!(result.max_duration_ns, 300);
        assert_eq!(result.average_ns(), 200);
    }

    #[test]
    fn test_average_truncates() {
        let mut result = TimerResult::new();
        result.record(1);
        result.record(2);

        // 3 / 2 truncates, it is not rounded up
        assert_eq!(result.average_ns(), 1);
    }

    #[test]
    fn test_record_zero_duration() {
        let mut result = TimerResult::new();
        result.record(0);

        assert_eq!(result.min_duration_ns, 0);
        assert_eq!(result.max_duration_ns, 0);
        assert_eq!(result.activation_count, 1);
    }

    #[test]
    fn test_invariant_min_avg_max() {
        let durations = [7, 13, 2, 99, 41, 41, 0, 1_000_000];
        let mut result = TimerResult::new();
        for d in durations {
            result.record(d);
        }

        assert_eq!(result.activation_count, durations.len() as i64);
        assert_eq!(result.total_duration_ns, durations.iter().sum::<i64>());
        assert_eq!(result.min_duration_ns, 0);
        assert_eq!(result.max_duration_ns, 1_000_000);
        assert!(result.min_duration_ns <= result.average_ns());
        assert!(result.average_ns() <= result.max_duration_ns);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_negative_duration_panics() {
        let mut result = TimerResult::new();
        result.record(-5);
    }

    #[test]
    fn test_overflow_panics_before_mutation() {
        let mut result = TimerResult::new();
        result.record(i64::MAX);
        let before = result;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| result.record(1)));
        assert!(outcome.is_err());
        assert_eq!(result, before);
        assert_eq!(result.activation_count, 1);
        assert_eq!(result.total_duration_ns, i64::MAX);
    }

    #[test]
    fn test_display_summary() {
        let mut result = TimerResult::new();
        result.record(500);
        result.record(1_500);

        let text = result.to_string();
        assert!(text.contains("\tminimum duration = 500 ns\n"));
        assert!(text.contains("\tmaximum duration = 1.500 µs\n"));
        assert!(text.contains("\taverage duration = 1.000 µs\n"));
        assert!(text.contains("\tactivations count = 2\n"));
        assert!(text.contains("\ttotal = 2.000 µs\n"));
    }

    #[test]
    fn test_display_without_samples() {
        let text = TimerResult::new().to_string();
        assert_eq!(text, "\tno activations recorded\n");
    }
}
