//! Configuration types for tickforge

use crate::consolidator::Resolution;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure (TOML file, CLI flags override)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterDefaults,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Whether buffered bars stay in RAM until packaging or are flushed to
/// flat files during the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPolicy {
    /// Keep every bar in memory and package archives directly at the end
    Retain,
    /// Periodically flush buffers to flat files, compress directories at
    /// the end
    Flush,
}

/// Converter defaults from the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterDefaults {
    #[serde(default = "default_memory_policy")]
    pub memory_policy: MemoryPolicy,

    /// Records processed between disk flushes in flush mode
    #[serde(default = "default_flush_interval")]
    pub flush_interval: u64,

    /// Worker count for directory compression
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// External decompression tool for compressed channel files
    #[serde(default = "default_extractor")]
    pub extractor: String,
}

fn default_memory_policy() -> MemoryPolicy {
    MemoryPolicy::Retain
}
fn default_flush_interval() -> u64 {
    1_000_000
}
fn default_parallelism() -> usize {
    1
}
fn default_extractor() -> String {
    "7z".to_string()
}

impl Default for ConverterDefaults {
    fn default() -> Self {
        Self {
            memory_policy: MemoryPolicy::Retain,
            flush_interval: 1_000_000,
            parallelism: 1,
            extractor: "7z".to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

/// Fully resolved settings for one conversion run
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Calendar day the channel files cover
    pub reference_date: NaiveDate,
    /// Directory of raw (possibly compressed) channel files
    pub source: PathBuf,
    /// Root of the output data tree
    pub destination: PathBuf,
    /// Requested bucket widths; each yields independent processors
    pub resolutions: Vec<Resolution>,
    pub memory_policy: MemoryPolicy,
    pub flush_interval: u64,
    pub parallelism: usize,
    pub extractor: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
