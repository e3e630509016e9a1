//! Archive packaging
//!
//! Two strategies, selected by memory policy. In retain mode buffered bars
//! stream straight from RAM into freshly created archives, grouped so all
//! contracts of one underlying share an archive per (resolution, kind). In
//! flush mode the flat directory tree written during the run is compressed
//! leaf by leaf in parallel. Both paths serialize through the same line
//! format and entry naming, so the logical archive content is identical.

use crate::error::ConvertError;
use crate::instrument::Instrument;
use crate::processor::Processor;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Stream every buffered bar into its archive, one pass, no intermediate
/// files. Returns the number of archives written.
pub fn write_archives(
    processors: &HashMap<Instrument, Vec<Processor>>,
) -> Result<usize, ConvertError> {
    // Group by archive path; BTreeMap for a deterministic write order.
    let mut groups: BTreeMap<&Path, Vec<&Processor>> = BTreeMap::new();
    for processor in processors.values().flatten() {
        if processor.pending() > 0 {
            groups.entry(processor.zip_path()).or_default().push(processor);
        }
    }

    for (zip_path, members) in groups.iter_mut() {
        members.sort_by(|a, b| a.entry_name().cmp(b.entry_name()));

        if let Some(parent) = zip_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if zip_path.exists() {
            fs::remove_file(zip_path)?;
        }

        let file = File::create(zip_path)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        for processor in members.iter() {
            writer
                .start_file(processor.entry_name(), entry_options())
                .map_err(io::Error::other)?;
            for bar in processor.bars() {
                writeln!(writer, "{}", bar.to_csv())?;
            }
        }
        writer.finish().map_err(io::Error::other)?;
        tracing::debug!(archive = %zip_path.display(), entries = members.len(), "wrote archive");
    }

    Ok(groups.len())
}

/// Compress every flat leaf directory under the destination tree into a
/// sibling archive, deleting the directory afterward. Failures are
/// reported per directory and do not abort sibling work. Returns the
/// number of directories compressed.
pub fn compress_directories(destination: &Path, parallelism: usize) -> Result<u64, ConvertError> {
    let leaves = leaf_directories(destination)?;
    tracing::info!(
        directories = leaves.len(),
        parallelism,
        "compressing flat directories"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .map_err(io::Error::other)?;

    let compressed = AtomicU64::new(0);
    pool.install(|| {
        leaves.par_iter().for_each(|dir| match compress_leaf(dir) {
            Ok(()) => {
                compressed.fetch_add(1, Ordering::Relaxed);
                tracing::info!(dir = %dir.display(), "compressed");
            }
            Err(e) => {
                tracing::error!(error = %e, dir = %dir.display(), "failed to compress directory");
            }
        });
    });

    Ok(compressed.into_inner())
}

/// Leaf directories of the `<dest>/<category>/usa/<resolution>/<underlying>`
/// tree, one per archive to produce
fn leaf_directories(destination: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut leaves = Vec::new();
    for category in ["equity", "option"] {
        let root = destination.join(category).join("usa");
        if !root.is_dir() {
            continue;
        }
        for resolution in subdirectories(&root)? {
            for underlying in subdirectories(&resolution)? {
                leaves.extend(subdirectories(&underlying)?);
            }
        }
    }
    leaves.sort();
    Ok(leaves)
}

fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

fn compress_leaf(dir: &Path) -> io::Result<()> {
    let zip_path = dir.with_extension("zip");

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            entries.push(path);
        }
    }
    entries.sort();

    let file = File::create(&zip_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    for path in &entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| io::Error::other(format!("unrepresentable file name in {dir:?}")))?;
        writer
            .start_file(name, entry_options())
            .map_err(io::Error::other)?;
        io::copy(&mut File::open(path)?, &mut writer)?;
    }
    writer.finish().map_err(io::Error::other)?;

    fs::remove_dir_all(dir)
}
