// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profiler Configuration
//!
//! Controls where the shutdown report goes and how durations are rendered.
//!
//! ## Sources
//!
//! - [`ProfilerConfig::default`]: report to stdout, 3 fractional digits
//! - [`ProfilerConfig::from_env`]: `CU_PROFILE_SINK` and `CU_PROFILE_PRECISION`
//! - [`ProfilerConfig::from_file`]: JSON or YAML file
//!
//! ## Example
//!
//! ```rust
//! use cu_profile::{ProfilerConfig, ReportSink};
//!
//! let config = ProfilerConfig::default()
//!     .with_sink(ReportSink::Stderr)
//!     .with_precision(1);
//! assert!(config.validate().is_ok());
//! ```
//!
//! A YAML file has the same shape as the struct:
//!
//! ```yaml
//! sink: log
//! precision: 2
//! header: "Timings:"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable selecting the report sink
pub const ENV_SINK: &str = "CU_PROFILE_SINK";

/// Environment variable selecting the report precision
pub const ENV_PRECISION: &str = "CU_PROFILE_PRECISION";

/// Largest accepted precision; finer than nanoseconds is meaningless
pub const MAX_PRECISION: usize = 9;

/// Destination of the shutdown report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSink {
    /// Process standard output
    #[default]
    Stdout,
    /// Process standard error
    Stderr,
    /// One `tracing::info!` event per report line
    Log,
    /// No report is produced
    #[serde(alias = "off")]
    Disabled,
}

impl FromStr for ReportSink {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(ReportSink::Stdout),
            "stderr" => Ok(ReportSink::Stderr),
            "log" => Ok(ReportSink::Log),
            "off" | "disabled" => Ok(ReportSink::Disabled),
            _ => Err(ConfigError::UnknownSink {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportSink::Stdout => "stdout",
            ReportSink::Stderr => "stderr",
            ReportSink::Log => "log",
            ReportSink::Disabled => "off",
        };
        f.write_str(name)
    }
}

/// Profiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Where the shutdown report is written
    pub sink: ReportSink,

    /// First line of the report
    pub header: String,

    /// Fractional digits for µs/ms/s values
    pub precision: usize,

    /// Emit the header even when no timer has reported
    pub report_empty: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sink: ReportSink::Stdout,
            header: "Profiler results:".to_string(),
            precision: 3,
            report_empty: true,
        }
    }
}

impl ProfilerConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report sink
    pub fn with_sink(mut self, sink: ReportSink) -> Self {
        self.sink = sink;
        self
    }

    /// Set the report precision
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set the report header line
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::InvalidPrecision {
                value: self.precision.to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&read()?),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Defaults overridden by `CU_PROFILE_SINK` / `CU_PROFILE_PRECISION`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(sink) = lookup(ENV_SINK) {
            config.sink = sink.parse()?;
        }

        if let Some(precision) = lookup(ENV_PRECISION) {
            config.precision = precision
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPrecision {
                    value: precision.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Unrecognized report sink name
    #[error("Unknown report sink '{value}' (expected stdout, stderr, log or off)")]
    UnknownSink { value: String },

    /// Precision not a number or out of range
    #[error("Invalid precision '{value}' (expected 0..=9)")]
    InvalidPrecision { value: String },

    /// File extension is not JSON or YAML
    #[error("Unsupported configuration file format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
