//! Parallel extraction of compressed channel files
//!
//! Raw channels may arrive as `.bz2` archives. Each one is handed to the
//! external decompression tool on its own blocking worker before any
//! reading begins; every extraction is independent, but any failure is
//! fatal since the merge would otherwise see an incomplete stream for that
//! channel.

use crate::error::ConvertError;
use futures_util::future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Extract every `.bz2` archive in `source` in place, returning the number
/// actually extracted. Archives whose extracted file already exists are
/// skipped.
pub async fn extract_archives(source: &Path, tool: &str) -> Result<usize, ConvertError> {
    let mut archives = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "bz2") {
            archives.push(path);
        }
    }
    if archives.is_empty() {
        return Ok(0);
    }

    tracing::info!(count = archives.len(), "extracting compressed channel files");
    let tasks: Vec<_> = archives
        .into_iter()
        .map(|file| {
            let tool = tool.to_string();
            let out_dir = source.to_path_buf();
            tokio::task::spawn_blocking(move || extract_one(&tool, &file, &out_dir))
        })
        .collect();

    let mut extracted = 0;
    for joined in future::join_all(tasks).await {
        if joined.map_err(io::Error::other)?? {
            extracted += 1;
        }
    }
    Ok(extracted)
}

fn extract_one(tool: &str, file: &Path, out_dir: &Path) -> Result<bool, ConvertError> {
    if target_of(file).exists() {
        tracing::debug!(file = %file.display(), "already extracted, skipping");
        return Ok(false);
    }

    tracing::info!(file = %file.display(), "extracting");
    let status = Command::new(tool)
        .arg("e")
        .arg(file)
        .arg(format!("-o{}", out_dir.display()))
        .arg("-y")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConvertError::ExtractorMissing {
                tool: tool.to_string(),
                source: e,
            },
            _ => ConvertError::Io(e),
        })?;

    if status.success() {
        Ok(true)
    } else {
        Err(ConvertError::Extraction {
            file: file.to_path_buf(),
            reason: format!("{tool} exited with {status}"),
        })
    }
}

fn target_of(archive: &Path) -> PathBuf {
    archive.with_extension("")
}
