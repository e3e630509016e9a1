//! End-to-end conversion tests: channel files in, archives out

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tickforge::config::{ConverterConfig, MemoryPolicy};
use tickforge::consolidator::Resolution;
use tickforge::converter::Converter;
use tickforge::package;
use zip::ZipArchive;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn config(
    source: &Path,
    destination: &Path,
    resolutions: Vec<Resolution>,
    policy: MemoryPolicy,
) -> ConverterConfig {
    ConverterConfig {
        reference_date: date(),
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        resolutions,
        memory_policy: policy,
        flush_interval: 3,
        parallelism: 2,
        extractor: "7z".to_string(),
    }
}

/// Two channels: SPY option trades/quotes split across files, plus an
/// equity line, with timestamps interleaved across the files
fn write_channels(source: &Path) {
    fs::write(
        source.join("spy_1.csv"),
        "34200100,T,SPY,20240315,C,450,10.0,1\n\
         34200900,T,SPY,20240315,C,450,10.2,2\n\
         34201050,T,SPY,20240315,C,450,10.1,3\n",
    )
    .unwrap();
    fs::write(
        source.join("spy_2.csv"),
        "34200200,Q,SPY,20240315,C,450,9.9,5,10.1,6\n\
         34200800,Q,SPY,20240315,C,450,10.0,4,10.3,2\n\
         34201200,T,SPY,20240315,P,445,2.5,1\n",
    )
    .unwrap();
    fs::write(source.join("aapl.csv"), "34200500,T,AAPL,,,,187.5,100\n").unwrap();
}

/// Every archive under `root`, keyed by path relative to it, with sorted
/// (entry name, contents) pairs
fn archives_under(root: &Path) -> BTreeMap<PathBuf, Vec<(String, String)>> {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, out);
            } else if path.extension().is_some_and(|e| e == "zip") {
                out.push(path);
            }
        }
    }
    let mut zips = Vec::new();
    walk(root, &mut zips);

    let mut result = BTreeMap::new();
    for zip_path in zips {
        let mut archive = ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            entries.push((entry.name().to_string(), contents));
        }
        entries.sort();
        result.insert(zip_path.strip_prefix(root).unwrap().to_path_buf(), entries);
    }
    result
}

#[tokio::test]
async fn test_convert_and_package_in_memory() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_channels(source.path());

    let mut converter = Converter::new(config(
        source.path(),
        dest.path(),
        vec![Resolution::Second],
        MemoryPolicy::Retain,
    ));
    let summary = converter.run().await.unwrap();
    assert_eq!(summary.ticks_processed, 7);
    assert_eq!(summary.instruments, 3);

    package::write_archives(converter.processors()).unwrap();
    let archives = archives_under(dest.path());

    // Option trades for both contracts share one archive.
    let trade_zip = archives
        .get(Path::new("option/usa/second/spy/20240315_trade_american.zip"))
        .expect("option trade archive");
    assert_eq!(trade_zip.len(), 2);

    let call_entry = &trade_zip
        .iter()
        .find(|(name, _)| name.contains("call"))
        .unwrap()
        .1;
    let lines: Vec<&str> = call_entry.lines().collect();
    // Bucket [09:30:00, 09:30:01): open 10.0, high 10.2, close 10.2.
    // The 09:30:01.050 tick forms the trailing partial bucket, emitted by
    // the final flush.
    assert_eq!(
        lines,
        vec!["34200000,10.0,10.2,10.0,10.2,3", "34201000,10.1,10.1,10.1,10.1,3"]
    );

    let quote_zip = archives
        .get(Path::new("option/usa/second/spy/20240315_quote_american.zip"))
        .expect("option quote archive");
    let quote_lines: Vec<&str> = quote_zip[0].1.lines().collect();
    assert_eq!(quote_lines, vec!["34200000,9.9,10.0,9.9,10.0,4,10.1,10.3,10.1,10.3,2"]);

    // The equity tick landed in its own tree.
    assert!(archives.contains_key(Path::new("equity/usa/second/aapl/20240315_trade.zip")));
}

#[tokio::test]
async fn test_memory_policies_produce_identical_archives() {
    let source_a = TempDir::new().unwrap();
    let source_b = TempDir::new().unwrap();
    let dest_a = TempDir::new().unwrap();
    let dest_b = TempDir::new().unwrap();
    write_channels(source_a.path());
    write_channels(source_b.path());

    let resolutions = vec![Resolution::Second, Resolution::Minute];

    let mut in_memory = Converter::new(config(
        source_a.path(),
        dest_a.path(),
        resolutions.clone(),
        MemoryPolicy::Retain,
    ));
    in_memory.run().await.unwrap();
    package::write_archives(in_memory.processors()).unwrap();

    let mut flushing = Converter::new(config(
        source_b.path(),
        dest_b.path(),
        resolutions,
        MemoryPolicy::Flush,
    ));
    flushing.run().await.unwrap();
    package::compress_directories(dest_b.path(), 2).unwrap();

    let a = archives_under(dest_a.path());
    let b = archives_under(dest_b.path());
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_tick_passthrough_resolution() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_channels(source.path());

    let mut converter = Converter::new(config(
        source.path(),
        dest.path(),
        vec![Resolution::Tick],
        MemoryPolicy::Retain,
    ));
    converter.run().await.unwrap();
    package::write_archives(converter.processors()).unwrap();

    let archives = archives_under(dest.path());
    let trade_zip = archives
        .get(Path::new("option/usa/tick/spy/20240315_trade_american.zip"))
        .expect("tick trade archive");
    let call_entry = &trade_zip
        .iter()
        .find(|(name, _)| name.contains("call"))
        .unwrap()
        .1;
    // Every trade tick appears verbatim.
    assert_eq!(
        call_entry.lines().collect::<Vec<_>>(),
        vec!["34200100,10.0,1", "34200900,10.2,2", "34201050,10.1,3"]
    );
}

#[tokio::test]
async fn test_corrupt_channel_aborts_run() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_channels(source.path());
    fs::write(source.path().join("bad.csv"), "34200000,T,SPY,garbage\n").unwrap();

    let mut converter = Converter::new(config(
        source.path(),
        dest.path(),
        vec![Resolution::Minute],
        MemoryPolicy::Retain,
    ));
    assert!(converter.run().await.is_err());
}
