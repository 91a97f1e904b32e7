// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Process-wide timing aggregator
//!
//! Exactly one [`ProfilerAggregator`] exists per process. It is created
//! lazily by the first timer report or query, or eagerly by
//! [`ProfilerAggregator::setup`]. Its constructor is private and the only
//! path to an instance is the [`OnceLock`] below, so a second aggregator
//! cannot be built.
//!
//! Statics are never dropped, so the shutdown report is explicit: call
//! [`ProfilerAggregator::shutdown`], or hold the [`ProfileGuard`] returned by
//! [`ProfilerAggregator::activate`] (what `use_profile!()` does) and let it
//! drop at the end of `main`.
//!
//! # Example
//!
//! ```rust
//! use cu_profile::ProfilerAggregator;
//!
//! let aggregator = ProfilerAggregator::setup();
//! aggregator.record_timer("doc-example", 1_000);
//! assert_eq!(aggregator.snapshot()["doc-example"].activation_count, 1);
//! ```

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::{ProfilerConfig, ReportSink};
use crate::error::{ProfileError, ProfileResult};
use crate::registry::{TimerRegistry, TimerResults};

static AGGREGATOR: OnceLock<ProfilerAggregator> = OnceLock::new();

/// The process-wide registry plus its reporting configuration
#[derive(Debug)]
pub struct ProfilerAggregator {
    registry: TimerRegistry,
    config: ProfilerConfig,
    activated: AtomicBool,
    reported: AtomicBool,
}

impl ProfilerAggregator {
    fn construct(config: ProfilerConfig) -> Self {
        debug!(sink = %config.sink, precision = config.precision, "Profiler aggregator initialized");
        Self {
            registry: TimerRegistry::new(),
            config,
            activated: AtomicBool::new(false),
            reported: AtomicBool::new(false),
        }
    }

    /// The aggregator, constructed with the default config on first use
    ///
    /// Does not activate the shutdown report.
    pub fn global() -> &'static Self {
        AGGREGATOR.get_or_init(|| Self::construct(ProfilerConfig::default()))
    }

    /// Ensure the aggregator exists and enable the shutdown report
    ///
    /// Idempotent. If the aggregator was already created (by an earlier
    /// report or `setup_with`) its configuration is kept.
    pub fn setup() -> &'static Self {
        let aggregator = Self::global();
        aggregator.activated.store(true, Ordering::Release);
        aggregator
    }

    /// Construct the aggregator with `config` and enable the shutdown report
    ///
    /// Fails with [`ProfileError::AlreadyInitialized`] when the aggregator
    /// already exists, including when a timer reported before this call.
    pub fn setup_with(config: ProfilerConfig) -> ProfileResult<&'static Self> {
        config.validate()?;

        let mut constructed = false;
        let aggregator = AGGREGATOR.get_or_init(|| {
            constructed = true;
            Self::construct(config)
        });
        if !constructed {
            return Err(ProfileError::AlreadyInitialized);
        }

        aggregator.activated.store(true, Ordering::Release);
        Ok(aggregator)
    }

    /// [`setup`](Self::setup), returning a guard that reports on drop
    pub fn activate() -> ProfileGuard {
        ProfileGuard {
            aggregator: Self::setup(),
        }
    }

    /// Whether the aggregator has been constructed yet
    pub fn is_initialized() -> bool {
        AGGREGATOR.get().is_some()
    }

    /// Configuration used for reporting
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Backing registry, for timers bound to the process-wide state
    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }

    /// Whether `setup`, `setup_with` or `activate` has been called
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Whether the shutdown report has already been emitted
    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::Acquire)
    }

    /// Accumulate `duration_ns` under `key`
    pub fn record_timer(&self, key: &str, duration_ns: i64) {
        self.registry.record_timer(key, duration_ns);
    }

    /// Independent copy of all current results
    pub fn snapshot(&self) -> TimerResults {
        self.registry.snapshot()
    }

    /// Prefix-filtered results keyed by the filter strings
    ///
    /// See [`TimerRegistry::snapshot_filtered`].
    pub fn snapshot_filtered<I, S>(&self, filter: I) -> TimerResults
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.snapshot_filtered(filter)
    }

    /// Report text for the current results, or `None` if there is nothing
    /// to print under the current config
    pub fn render_report(&self) -> Option<String> {
        self.registry.render_report(
            &self.config.header,
            self.config.precision,
            self.config.report_empty,
        )
    }

    /// Write the report to `out`, regardless of the configured sink
    pub fn write_report<W: Write>(&self, out: &mut W) -> ProfileResult<()> {
        if let Some(report) = self.render_report() {
            out.write_all(report.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }

    /// Emit the report to the configured sink
    ///
    /// Only the first call after activation produces output; without
    /// activation this is a no-op and results stay queryable in memory.
    pub fn shutdown(&self) {
        self.shutdown_with(|sink| -> Box<dyn Write> {
            match sink {
                ReportSink::Stderr => Box::new(std::io::stderr()),
                _ => Box::new(std::io::stdout()),
            }
        });
    }

    // `console` opens the stream for the Stdout and Stderr sinks.
    fn shutdown_with<F>(&self, console: F)
    where
        F: FnOnce(ReportSink) -> Box<dyn Write>,
    {
        if !self.is_activated() {
            debug!("Profiler not activated, skipping shutdown report");
            return;
        }
        if self.reported.swap(true, Ordering::AcqRel) {
            return;
        }

        let sink = self.config.sink;
        debug!(keys = self.registry.len(), sink = %sink, "Emitting profiler report");

        let outcome = match sink {
            ReportSink::Stdout | ReportSink::Stderr => self.write_report(&mut console(sink)),
            ReportSink::Log => {
                if let Some(report) = self.render_report() {
                    for line in report.lines() {
                        info!("{line}");
                    }
                }
                Ok(())
            }
            ReportSink::Disabled => Ok(()),
        };

        if let Err(e) = outcome {
            warn!(error = %e, "Failed to write profiler report");
        }
    }
}

/// Emits the shutdown report when dropped
///
/// Returned by [`ProfilerAggregator::activate`].
#[must_use = "the report is printed when the guard is dropped"]
#[derive(Debug)]
pub struct ProfileGuard {
    aggregator: &'static ProfilerAggregator,
}

impl ProfileGuard {
    /// The aggregator this guard reports for
    pub fn aggregator(&self) -> &'static ProfilerAggregator {
        self.aggregator
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        self.aggregator.shutdown();
    }
}
