//! Convert command implementation

use crate::config::{Config, ConverterConfig, MemoryPolicy};
use crate::consolidator::Resolution;
use crate::converter::Converter;
use crate::package;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Source directory of raw channel files
    #[arg(short, long)]
    pub source: PathBuf,

    /// Destination data directory
    #[arg(short, long)]
    pub destination: PathBuf,

    /// Calendar day the channel files cover (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Resolutions to consolidate (repeat or comma-separate)
    #[arg(long = "resolution", value_delimiter = ',', default_values_t = vec![Resolution::Minute])]
    pub resolutions: Vec<Resolution>,

    /// Override the configured memory policy
    #[arg(long)]
    pub memory_policy: Option<MemoryPolicy>,

    /// Override the records processed between disk flushes
    #[arg(long)]
    pub flush_interval: Option<u64>,

    /// Override the directory compression worker count
    #[arg(long)]
    pub parallelism: Option<usize>,
}

impl ConvertArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let settings = self.settings(config);
        let memory_policy = settings.memory_policy;
        let destination = settings.destination.clone();
        let parallelism = settings.parallelism;

        let mut converter = Converter::new(settings);
        let summary = converter.run().await?;
        tracing::info!(
            ticks = summary.ticks_processed,
            instruments = summary.instruments,
            "conversion pass complete"
        );

        match memory_policy {
            MemoryPolicy::Retain => {
                let archives = package::write_archives(converter.processors())?;
                tracing::info!(archives, "packaged buffered bars");
            }
            MemoryPolicy::Flush => {
                let archives = package::compress_directories(&destination, parallelism)?;
                tracing::info!(archives, "compressed flat directories");
            }
        }

        Ok(())
    }

    /// Resolve run settings: config file defaults, CLI flags win
    fn settings(&self, config: &Config) -> ConverterConfig {
        ConverterConfig {
            reference_date: self.date,
            source: self.source.clone(),
            destination: self.destination.clone(),
            resolutions: self.resolutions.clone(),
            memory_policy: self
                .memory_policy
                .unwrap_or(config.converter.memory_policy),
            flush_interval: self
                .flush_interval
                .unwrap_or(config.converter.flush_interval),
            parallelism: self.parallelism.unwrap_or(config.converter.parallelism),
            extractor: config.converter.extractor.clone(),
        }
    }
}
