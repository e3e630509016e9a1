//! Per-instrument bar processing
//!
//! A processor owns one consolidator for one (instrument, record kind,
//! resolution), buffers the bars it emits in insertion order, and knows its
//! output paths. Flushing to disk is the backpressure valve bounding memory
//! when a day holds more contracts than fit in RAM.

pub mod paths;

use crate::consolidator::{Bar, Consolidator, Resolution};
use crate::instrument::Instrument;
use crate::source::{Tick, TickKind};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Consolidates and buffers one (instrument, kind, resolution) output unit
pub struct Processor {
    instrument: Instrument,
    kind: TickKind,
    resolution: Resolution,
    consolidator: Consolidator,
    queue: VecDeque<Bar>,
    // Path derivation is invariant for the processor's lifetime.
    zip_path: PathBuf,
    entry_name: String,
}

impl Processor {
    /// Create a processor; the instrument is sanitized and output paths are
    /// derived once here
    pub fn new(
        instrument: &Instrument,
        date: NaiveDate,
        kind: TickKind,
        resolution: Resolution,
        destination: &Path,
    ) -> Self {
        let instrument = instrument.sanitized();
        let zip_path = paths::zip_path(destination, &instrument, date, resolution, kind);
        let entry_name = paths::entry_name(&instrument, date, resolution, kind);
        Self {
            instrument,
            kind,
            resolution,
            consolidator: Consolidator::for_kind(kind, resolution),
            queue: VecDeque::new(),
            zip_path,
            entry_name,
        }
    }

    /// Feed one tick; ticks of the other record kind are discarded
    pub fn process(&mut self, tick: &Tick) {
        if tick.kind() != self.kind {
            return;
        }
        if let Some(bar) = self.consolidator.update(tick) {
            self.queue.push_back(bar);
        }
    }

    /// Force any closeable bucket, emit a trailing partial bucket on the
    /// final flush, and (unless retaining in memory) append the buffered
    /// bars to the flat file and clear the buffer
    pub fn flush(
        &mut self,
        frontier: NaiveDateTime,
        retain_in_memory: bool,
        is_final: bool,
    ) -> io::Result<()> {
        if let Some(bar) = self.consolidator.scan(frontier) {
            self.queue.push_back(bar);
        }
        if is_final {
            if let Some(bar) = self.consolidator.take_working() {
                self.queue.push_back(bar);
            }
        }
        if retain_in_memory || self.queue.is_empty() {
            return Ok(());
        }

        let dir = paths::flat_dir(&self.zip_path);
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&self.entry_name))?;
        let mut writer = BufWriter::new(file);
        for bar in self.queue.drain(..) {
            writeln!(writer, "{}", bar.to_csv())?;
        }
        writer.flush()
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn kind(&self) -> TickKind {
        self.kind
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Archive this processor's entry belongs to
    pub fn zip_path(&self) -> &Path {
        &self.zip_path
    }

    /// Entry name inside the archive
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Buffered bars in emission order
    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.queue.iter()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
