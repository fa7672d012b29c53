//! Pipeline metrics
//!
//! Recorded through the `metrics` facade; they go nowhere unless an
//! exporter is installed.

use crate::feed::FeedId;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Record arrival to composite top of book change
    TopOfBookChange,
    /// Publication queue hand-off to sink write
    Publication,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Records emitted by the merger
    Merged,
    /// Composite top of book changes
    TopOfBookChanges,
    /// Events written by the reporter
    Published,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let micros = duration.as_secs_f64() * 1_000_000.0;
    match metric {
        LatencyMetric::TopOfBookChange => {
            metrics::histogram!("consolidator_top_of_book_latency_us").record(micros)
        }
        LatencyMetric::Publication => {
            metrics::histogram!("consolidator_publication_latency_us").record(micros)
        }
    }
}

/// Increment a counter
pub fn increment(metric: CounterMetric, by: u64) {
    let counter = match metric {
        CounterMetric::Merged => metrics::counter!("consolidator_records_merged_total"),
        CounterMetric::TopOfBookChanges => metrics::counter!("consolidator_top_of_book_changes_total"),
        CounterMetric::Published => metrics::counter!("consolidator_events_published_total"),
    };
    counter.increment(by);
}

/// Count a line a feed could not parse
pub fn record_rejected_line(feed_id: FeedId) {
    metrics::counter!("consolidator_rejected_lines_total", "feed" => feed_id.to_string()).increment(1);
}

/// Count a top of book change and its latency
pub fn record_top_of_book_change(latency: Duration) {
    increment(CounterMetric::TopOfBookChanges, 1);
    record_latency(LatencyMetric::TopOfBookChange, latency);
}

/// Number of symbols a worker lane owns
pub fn set_lane_symbols(lane: usize, symbols: usize) {
    metrics::gauge!("consolidator_lane_symbols", "lane" => lane.to_string()).set(symbols as f64);
}
