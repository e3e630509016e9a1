//! Conversion orchestration
//!
//! Drives one pass over a trading day: extract compressed channels, merge
//! every channel into one time-ordered stream, route each tick to its
//! instrument's processors, and flush. The merge-and-consolidate loop is
//! strictly single-threaded; consolidation state is never shared across
//! workers.

mod extract;

pub use extract::extract_archives;

use crate::config::{ConverterConfig, MemoryPolicy};
use crate::error::ConvertError;
use crate::instrument::Instrument;
use crate::processor::Processor;
use crate::source::{BufferedReader, ChannelReader, Synchronizer, TickKind};
use crate::telemetry::ProgressReporter;
use chrono::Duration;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

/// Ticks between progress log lines
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Outcome of one conversion pass
#[derive(Debug)]
pub struct RunSummary {
    pub ticks_processed: u64,
    pub instruments: usize,
}

/// One-day batch converter: channel files in, consolidated bars out
pub struct Converter {
    config: ConverterConfig,
    processors: HashMap<Instrument, Vec<Processor>>,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            processors: HashMap::new(),
        }
    }

    /// Run the full merge/consolidate pass. On return every known
    /// processor has been finally flushed; no buffered or in-flight
    /// partial bar is lost.
    pub async fn run(&mut self) -> Result<RunSummary, ConvertError> {
        extract_archives(&self.config.source, &self.config.extractor).await?;

        let files = self.channel_files()?;
        tracing::info!(
            channels = files.len(),
            date = %self.config.reference_date,
            policy = ?self.config.memory_policy,
            "loading channel readers"
        );

        let mut readers = Vec::with_capacity(files.len());
        for file in &files {
            let reader = ChannelReader::open(file, self.config.reference_date)?;
            readers.push(BufferedReader::spawn(reader));
        }
        let mut synchronizer = Synchronizer::new(readers);
        synchronizer.prime().await?;

        let config = self.config.clone();
        let progress = ProgressReporter::new(config.reference_date);
        let mut touched: HashSet<Instrument> = HashSet::new();
        let mut processed: u64 = 0;

        while let Some(tick) = synchronizer.advance().await? {
            let frontier = tick.time;
            touched.insert(tick.instrument.clone());

            let processors = self
                .processors
                .entry(tick.instrument.clone())
                .or_insert_with(|| build_processors(&config, &tick.instrument));
            for processor in processors.iter_mut() {
                processor.process(&tick);
            }

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                progress.report(processed, frontier, self.processors.len());
            }

            // Bounded-memory mode: periodically purge the buffers of every
            // instrument touched since the previous purge.
            if config.memory_policy == MemoryPolicy::Flush
                && processed % config.flush_interval == 0
            {
                tracing::info!(
                    instruments = touched.len(),
                    "writing memory buffers to disk"
                );
                for instrument in touched.drain() {
                    if let Some(processors) = self.processors.get_mut(&instrument) {
                        for processor in processors.iter_mut() {
                            processor.flush(frontier, false, false)?;
                        }
                    }
                }
            }
        }

        tracing::info!("performing final flush");
        let end_of_day =
            self.config.reference_date.and_time(chrono::NaiveTime::MIN) + Duration::days(1);
        let retain = self.config.memory_policy == MemoryPolicy::Retain;
        for processors in self.processors.values_mut() {
            for processor in processors.iter_mut() {
                processor.flush(end_of_day, retain, true)?;
            }
        }

        tracing::info!(
            ticks = processed,
            instruments = self.processors.len(),
            source = %self.config.source.display(),
            "finished processing directory"
        );
        Ok(RunSummary {
            ticks_processed: processed,
            instruments: self.processors.len(),
        })
    }

    /// All processors created during the run, keyed by instrument
    pub fn processors(&self) -> &HashMap<Instrument, Vec<Processor>> {
        &self.processors
    }

    /// Channel files ordered descending by size so the largest start first
    fn channel_files(&self) -> Result<Vec<PathBuf>, ConvertError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.config.source)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "csv") {
                let size = fs::metadata(&path)?.len();
                files.push((path, size));
            }
        }
        if files.is_empty() {
            return Err(ConvertError::NoInputFiles {
                dir: self.config.source.clone(),
            });
        }
        files.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }
}

/// One processor per requested resolution and record kind
fn build_processors(config: &ConverterConfig, instrument: &Instrument) -> Vec<Processor> {
    let mut list = Vec::with_capacity(config.resolutions.len() * 2);
    for resolution in &config.resolutions {
        for kind in [TickKind::Trade, TickKind::Quote] {
            list.push(Processor::new(
                instrument,
                config.reference_date,
                kind,
                *resolution,
                &config.destination,
            ));
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidator::Resolution;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn config(source: &TempDir, dest: &TempDir, policy: MemoryPolicy) -> ConverterConfig {
        ConverterConfig {
            reference_date: date(),
            source: source.path().to_path_buf(),
            destination: dest.path().to_path_buf(),
            resolutions: vec![Resolution::Minute],
            memory_policy: policy,
            flush_interval: 2,
            parallelism: 1,
            extractor: "7z".to_string(),
        }
    }

    fn write_channel(dir: &TempDir, name: &str, lines: &[&str]) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_source_is_fatal() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let mut converter = Converter::new(config(&source, &dest, MemoryPolicy::Retain));
        let err = converter.run().await.unwrap_err();
        assert!(matches!(err, ConvertError::NoInputFiles { .. }));
    }

    #[tokio::test]
    async fn test_lazy_processor_creation_per_instrument() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write_channel(
            &source,
            "a.csv",
            &[
                "34200000,T,SPY,20240315,C,450,1.0,1",
                "34200500,Q,SPY,20240315,C,450,0.9,5,1.1,5",
            ],
        );
        write_channel(&source, "b.csv", &["34200100,T,AAPL,,,,187.5,100"]);

        let mut converter = Converter::new(config(&source, &dest, MemoryPolicy::Retain));
        let summary = converter.run().await.unwrap();

        assert_eq!(summary.ticks_processed, 3);
        assert_eq!(summary.instruments, 2);
        // One trade + one quote processor per resolution per instrument.
        for processors in converter.processors().values() {
            assert_eq!(processors.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_retain_mode_keeps_bars_in_memory() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write_channel(
            &source,
            "a.csv",
            &[
                "34200000,T,SPY,20240315,C,450,1.0,1",
                "34260000,T,SPY,20240315,C,450,1.2,1",
            ],
        );

        let mut converter = Converter::new(config(&source, &dest, MemoryPolicy::Retain));
        converter.run().await.unwrap();

        let buffered: usize = converter
            .processors()
            .values()
            .flatten()
            .map(|p| p.pending())
            .sum();
        // Two minutes of trades -> two trade bars, nothing written yet.
        assert_eq!(buffered, 2);
        assert!(!dest.path().join("option").exists());
    }

    #[tokio::test]
    async fn test_flush_mode_writes_flat_files_and_clears() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write_channel(
            &source,
            "a.csv",
            &[
                "34200000,T,SPY,20240315,C,450,1.0,1",
                "34260000,T,SPY,20240315,C,450,1.2,1",
                "34320000,T,SPY,20240315,C,450,1.4,1",
            ],
        );

        let mut converter = Converter::new(config(&source, &dest, MemoryPolicy::Flush));
        converter.run().await.unwrap();

        let buffered: usize = converter
            .processors()
            .values()
            .flatten()
            .map(|p| p.pending())
            .sum();
        assert_eq!(buffered, 0);

        let flat = dest
            .path()
            .join("option/usa/minute/spy/20240315_trade_american")
            .join("20240315_spy_minute_trade_american_call_4500000_20240315.csv");
        let contents = std::fs::read_to_string(flat).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_channel_files_sorted_by_size_descending() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write_channel(&source, "small.csv", &["34200000,T,AAPL,,,,1.0,1"]);
        write_channel(
            &source,
            "large.csv",
            &[
                "34200000,T,SPY,20240315,C,450,1.0,1",
                "34200100,T,SPY,20240315,C,450,1.0,1",
            ],
        );
        let converter = Converter::new(config(&source, &dest, MemoryPolicy::Retain));
        let files = converter.channel_files().unwrap();
        assert!(files[0].ends_with("large.csv"));
        assert!(files[1].ends_with("small.csv"));
    }
}
