//! Run-level error taxonomy
//!
//! A trading day's output is all-or-nothing: every variant here except
//! packaging I/O (handled per directory in [`crate::package`]) aborts the
//! whole batch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a conversion run
#[derive(Debug, Error)]
pub enum ConvertError {
    /// External decompression tool could not be spawned
    #[error("decompression tool '{tool}' could not be started: {source}")]
    ExtractorMissing {
        tool: String,
        #[source]
        source: io::Error,
    },
    /// External decompression tool exited unsuccessfully
    #[error("extraction failed for {file}: {reason}")]
    Extraction { file: PathBuf, reason: String },
    /// No decodable channel files found after extraction
    #[error("no channel files found in {dir}")]
    NoInputFiles { dir: PathBuf },
    /// A raw record could not be decoded; skipping it would silently
    /// corrupt downstream bars
    #[error("parse error in {file} line {line}: {reason}")]
    Parse {
        file: PathBuf,
        line: u64,
        reason: String,
    },
    /// Filesystem failure outside packaging
    #[error(transparent)]
    Io(#[from] io::Error),
}
