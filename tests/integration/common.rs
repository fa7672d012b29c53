//! Shared fixtures

#![allow(dead_code)]

use quote_consolidator::feed::{FeedMerger, FileSource, HeaderPolicy, MemorySource};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const FEED_A: &[&str] = &[
    "10:00:00.000,SPY,205.12,500,205.13,200",
    "10:00:00.002,SPY,205.10,200,205.13,200",
    "10:00:00.002,AAPL,150.00,100,150.02,100",
    "10:00:00.003,SPY,205.09,400,205.14,1200",
    "10:00:00.005,SPY,205.08,120,205.13,40",
];

pub const FEED_B: &[&str] = &[
    "10:00:00.001,SPY,205.12,600,205.14,200",
    "10:00:00.001,SPY,205.11,320,205.14,200",
    "10:00:00.002,AAPL,150.01,50,150.03,70",
    "10:00:00.005,SPY,205.10,120,205.13,70",
];

pub const FEED_C: &[&str] = &[
    "10:00:00.001,SPY,205.11,300,205.14,200",
    "not a record",
    "10:00:00.003,SPY,205.09,400,205.13,200",
    "10:00:00.004,AAPL,150.01,25,150.02,10",
    "10:00:00.004,SPY,205.09,250,205.15,600",
];

/// Write each feed to its own file, with a header line
pub fn write_feeds(feeds: &[&[&str]]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = feeds
        .iter()
        .enumerate()
        .map(|(i, lines)| {
            let path = dir.path().join(format!("feed_{i}.csv"));
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "time,symbol,bid,bid_size,ask,ask_size").unwrap();
            for line in *lines {
                writeln!(file, "{line}").unwrap();
            }
            path
        })
        .collect();
    (dir, paths)
}

pub fn file_merger(paths: &[PathBuf]) -> FeedMerger<FileSource> {
    let mut merger = FeedMerger::new(',', HeaderPolicy::Auto);
    for path in paths {
        merger.add_source(FileSource::open(path).unwrap());
    }
    merger
}

pub fn memory_merger(feeds: &[&[&str]]) -> FeedMerger<MemorySource> {
    let mut merger = FeedMerger::new(',', HeaderPolicy::Absent);
    for (i, lines) in feeds.iter().enumerate() {
        merger.add_source(MemorySource::new(format!("feed_{i}"), lines.iter().copied()));
    }
    merger
}
