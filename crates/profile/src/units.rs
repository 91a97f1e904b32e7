// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Human-readable duration scaling
//!
//! Durations are stored as integer nanoseconds and rendered in the largest
//! unit that keeps the integral part below 1000.

const NS_PER_US: i64 = 1_000;
const NS_PER_MS: i64 = 1_000_000;
const NS_PER_S: i64 = 1_000_000_000;

/// Time unit picked for a rendered duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// Pick the unit for a duration of `nanos` nanoseconds
    pub fn for_nanos(nanos: i64) -> Self {
        if nanos < NS_PER_US {
            TimeUnit::Nanoseconds
        } else if nanos < NS_PER_MS {
            TimeUnit::Microseconds
        } else if nanos < NS_PER_S {
            TimeUnit::Milliseconds
        } else {
            TimeUnit::Seconds
        }
    }

    /// Unit suffix used in reports
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "µs",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
        }
    }

    fn nanos_per_unit(&self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => NS_PER_US,
            TimeUnit::Milliseconds => NS_PER_MS,
            TimeUnit::Seconds => NS_PER_S,
        }
    }
}

/// Render `nanos` scaled to ns/µs/ms/s
///
/// Nanoseconds are always printed as an integer; larger units use
/// `precision` fractional digits.
///
/// # Panics
///
/// Panics if `nanos` is negative.
pub fn scale_duration_ns(nanos: i64, precision: usize) -> String {
    assert!(nanos >= 0, "duration must be non-negative, got {nanos}");

    let unit = TimeUnit::for_nanos(nanos);
    match unit {
        TimeUnit::Nanoseconds => format!("{} {}", nanos, unit.suffix()),
        _ => {
            let scaled = nanos as f64 / unit.nanos_per_unit() as f64;
            format!("{:.*} {}", precision, scaled, unit.suffix())
        }
    }
}
