//! Configuration types for quote-consolidator

use crate::feed::HeaderPolicy;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Feed file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Field separator
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Whether each file starts with a header line
    #[serde(default)]
    pub header: HeaderPolicy,
}

fn default_separator() -> char {
    ','
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            header: HeaderPolicy::default(),
        }
    }
}

/// Worker pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of book worker lanes; symbols are hashed across them
    #[serde(default = "default_worker_lanes")]
    pub worker_lanes: usize,

    /// How long a blocked queue consumer waits before re-checking for stop (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Recompute every book from scratch after each update and fail on mismatch
    #[serde(default)]
    pub verify_books: bool,
}

fn default_worker_lanes() -> usize {
    6
}
fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_lanes: default_worker_lanes(),
            poll_interval_ms: default_poll_interval_ms(),
            verify_books: false,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top of book event encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// `HH:MM:SS.mmm,SYMBOL,bid,bidSize,ask,askSize`
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

/// End of run statistics encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatsFormat {
    #[default]
    Table,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write a line per top of book change
    #[serde(default = "default_true")]
    pub events: bool,

    #[serde(default)]
    pub event_format: EventFormat,

    #[serde(default)]
    pub stats_format: StatsFormat,
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            events: true,
            event_format: EventFormat::default(),
            stats_format: StatsFormat::default(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            log_file: None,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    ///
    /// Returns whether the file was found alongside the config.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<(Self, bool), ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok((config, true)),
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), false))
            }
            Err(e) => Err(e),
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.worker_lanes == 0 {
            return Err(ConfigError::Invalid("pipeline.worker_lanes must be at least 1".into()));
        }
        if self.pipeline.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("pipeline.poll_interval_ms must be positive".into()));
        }
        if self.feed.separator.is_whitespace() || self.feed.separator == '.' || self.feed.separator == ':' {
            return Err(ConfigError::Invalid(format!(
                "feed.separator {:?} clashes with field contents",
                self.feed.separator
            )));
        }
        Ok(())
    }
}
