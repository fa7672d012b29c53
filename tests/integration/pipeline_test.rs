//! End-to-end pipeline runs

use crate::common::{file_merger, memory_merger, write_feeds, FEED_A, FEED_B, FEED_C};
use quote_consolidator::config::PipelineConfig;
use quote_consolidator::feed::{FeedMerger, LineSource, Symbol};
use quote_consolidator::orderbook::{CompositeBook, TopOfBook};
use quote_consolidator::pipeline::{self, StopHandle};
use quote_consolidator::report::{CollectingSink, DiscardSink};
use std::collections::HashMap;

fn config(lanes: usize) -> PipelineConfig {
    PipelineConfig {
        worker_lanes: lanes,
        poll_interval_ms: 2,
        verify_books: true,
    }
}

/// Single-threaded replay of the merged stream
fn reference_events<S: LineSource>(merger: FeedMerger<S>) -> Vec<TopOfBook> {
    let mut books: HashMap<Symbol, CompositeBook> = HashMap::new();
    let mut events = Vec::new();
    for record in merger {
        let book = books
            .entry(record.symbol)
            .or_insert_with(|| CompositeBook::new(record.symbol));
        if book.update(&record) {
            events.push(book.top_of_book());
        }
    }
    events
}

fn for_symbol(events: &[TopOfBook], symbol: &str) -> Vec<TopOfBook> {
    events
        .iter()
        .filter(|e| e.symbol.as_str() == symbol)
        .copied()
        .collect()
}

#[tokio::test]
async fn test_pipeline_matches_reference() {
    let feeds = [FEED_A, FEED_B, FEED_C];
    let expected = reference_events(memory_merger(&feeds));

    let sink = CollectingSink::new();
    let summary = pipeline::run(memory_merger(&feeds), Some(sink.clone()), &config(3), StopHandle::new())
        .await
        .unwrap();
    let events = sink.events();

    assert_eq!(events.len(), expected.len());
    for symbol in ["SPY", "AAPL"] {
        assert_eq!(for_symbol(&events, symbol), for_symbol(&expected, symbol), "{symbol}");
    }

    assert!(!summary.cancelled);
    assert_eq!(summary.records_merged, 13);
    assert_eq!(summary.records_applied, 13);
    assert_eq!(summary.top_changes, expected.len() as u64);
    assert_eq!(summary.events_published, expected.len() as u64);
    assert_eq!(summary.rejected_lines(), 1);
    let names: Vec<&str> = summary.symbols.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(names, vec!["AAPL", "SPY"]);
}

#[tokio::test]
async fn test_spy_events_from_files() {
    let (_dir, paths) = write_feeds(&[FEED_A, FEED_B, FEED_C]);
    let sink = CollectingSink::new();
    let summary = pipeline::run(file_merger(&paths), Some(sink.clone()), &config(2), StopHandle::new())
        .await
        .unwrap();

    let spy: Vec<String> = for_symbol(&sink.events(), "SPY")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        &spy[..4],
        &[
            "10:00:00.000,SPY,205.12,500,205.13,200",
            "10:00:00.001,SPY,205.12,1100,205.13,200",
            "10:00:00.001,SPY,205.12,500,205.13,200",
            "10:00:00.002,SPY,205.11,620,205.13,200",
        ]
    );

    let stats = summary.symbol("SPY").unwrap();
    assert_eq!(stats.update_count, spy.len() as u64);
    assert!(stats.min_latency_us <= stats.median_latency_us);
    assert!(stats.median_latency_us <= stats.p99_latency_us);
    assert!(stats.p99_latency_us <= stats.max_latency_us);
    assert!(summary.feeds.iter().all(|f| f.header_skipped));
}

#[tokio::test]
async fn test_lane_count_does_not_change_output() {
    let feeds = [FEED_A, FEED_B, FEED_C];
    let mut per_lane_count = Vec::new();
    for lanes in [1, 4] {
        let sink = CollectingSink::new();
        pipeline::run(memory_merger(&feeds), Some(sink.clone()), &config(lanes), StopHandle::new())
            .await
            .unwrap();
        per_lane_count.push(sink.events());
    }
    for symbol in ["SPY", "AAPL"] {
        assert_eq!(
            for_symbol(&per_lane_count[0], symbol),
            for_symbol(&per_lane_count[1], symbol)
        );
    }
}

#[tokio::test]
async fn test_without_sink_still_collects_statistics() {
    let summary = pipeline::run(
        memory_merger(&[FEED_A, FEED_B]),
        None::<DiscardSink>,
        &config(2),
        StopHandle::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.events_published, 0);
    assert_eq!(summary.records_merged, 9);
    assert_eq!(summary.records_applied, 9);
    let updates: u64 = summary.symbols.iter().map(|s| s.update_count).sum();
    assert_eq!(summary.top_changes, updates);
    assert!(summary.symbol("SPY").unwrap().update_count > 0);
    assert!(summary.symbol("AAPL").unwrap().update_count > 0);
}

#[tokio::test]
async fn test_stop_before_start_cancels() {
    let stop = StopHandle::new();
    stop.request_stop();

    let summary = pipeline::run(
        memory_merger(&[FEED_A, FEED_B, FEED_C]),
        Some(CollectingSink::new()),
        &config(2),
        stop,
    )
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert!(summary.records_merged <= 1);
    assert_eq!(summary.records_applied, 0);
    assert_eq!(summary.top_changes, 0);
    assert_eq!(summary.events_published, 0);
}

#[tokio::test]
async fn test_no_feeds() {
    let summary = pipeline::run(
        memory_merger(&[]),
        Some(CollectingSink::new()),
        &config(2),
        StopHandle::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_merged, 0);
    assert!(summary.symbols.is_empty());
}
