//! Concurrent consolidation pipeline
//!
//! One blocking producer runs the feed merger and fans records out by symbol
//! to worker lanes. Each lane owns its books outright and forwards top of
//! book changes to a single reporter task.

mod distributor;
mod lane;
mod queue;
mod reporter;

pub use distributor::{lane_index, Distributor};
pub use lane::{run_lane, BookLane, LaneMessage, LaneReport, Published};
pub use queue::{channel, channel_with_stop, Popped, QueueReceiver, QueueSender, StopHandle};
pub use reporter::run_reporter;

use crate::config::PipelineConfig;
use crate::feed::{FeedMerger, FeedStats, LineSource};
use crate::orderbook::ConsistencyError;
use crate::report::{RunSummary, TopOfBookSink};
use crate::telemetry::{self, CounterMetric};
use chrono::Utc;
use std::time::Instant;
use thiserror::Error;

/// Pipeline failure
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("book verification failed: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("event sink failed: {0}")]
    Sink(String),
    #[error("{task} task failed: {message}")]
    Task { task: &'static str, message: String },
}

impl PipelineError {
    fn task(task: &'static str, err: tokio::task::JoinError) -> Self {
        PipelineError::Task {
            task,
            message: err.to_string(),
        }
    }
}

/// Producer side result
struct ProducerReport {
    merged: u64,
    feeds: Vec<FeedStats>,
    cancelled: bool,
}

/// Merge on the current thread, handing records to the distributor
fn produce<S: LineSource>(
    mut merger: FeedMerger<S>,
    mut distributor: Distributor,
    stop: StopHandle,
) -> ProducerReport {
    let mut cancelled = false;
    while let Some(record) = merger.next_record() {
        if stop.is_stop_requested() {
            cancelled = true;
            break;
        }
        if !distributor.dispatch(record) {
            break;
        }
        telemetry::increment(CounterMetric::Merged, 1);
    }
    tracing::info!(
        merged = merger.emitted(),
        dispatched = distributor.dispatched(),
        cancelled,
        "Feeds drained"
    );
    distributor.finish();
    ProducerReport {
        merged: merger.emitted(),
        feeds: merger.feed_stats(),
        cancelled,
    }
}

/// Run the whole pipeline to completion
///
/// Events go to `sink` when one is given. Requesting a stop on `stop`
/// cancels the run; books built so far are still reported.
pub async fn run<S, K>(
    merger: FeedMerger<S>,
    sink: Option<K>,
    config: &PipelineConfig,
    stop: StopHandle,
) -> Result<RunSummary, PipelineError>
where
    S: LineSource + 'static,
    K: TopOfBookSink + 'static,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let lanes = config.worker_lanes.max(1);
    let poll_interval = config.poll_interval();

    tracing::info!(
        feeds = merger.feed_count(),
        lanes,
        verify = config.verify_books,
        "Starting pipeline"
    );

    let (event_tx, reporter) = match sink {
        Some(sink) => {
            let (tx, rx) = channel(poll_interval);
            (Some(tx), Some(tokio::spawn(run_reporter(sink, rx))))
        }
        None => (None, None),
    };
    let reporter_stop = event_tx.as_ref().map(QueueSender::stop_handle);

    let mut senders = Vec::with_capacity(lanes);
    let mut lane_handles = Vec::with_capacity(lanes);
    for id in 0..lanes {
        let (tx, rx) = channel_with_stop(poll_interval, stop.clone());
        senders.push(tx);
        lane_handles.push(tokio::spawn(run_lane(
            BookLane::new(id, config.verify_books),
            rx,
            event_tx.clone(),
        )));
    }
    drop(event_tx);

    let distributor = Distributor::new(senders);
    let producer_stop = stop.clone();
    let producer =
        tokio::task::spawn_blocking(move || produce(merger, distributor, producer_stop));

    let mut reports = Vec::with_capacity(lanes);
    let mut failure = None;
    for handle in lane_handles {
        match handle.await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Lane failed, stopping pipeline");
                stop.request_stop();
                failure.get_or_insert(e);
            }
            Err(e) => {
                stop.request_stop();
                failure.get_or_insert(PipelineError::task("lane", e));
            }
        }
    }
    let elapsed = start.elapsed();

    let producer = producer
        .await
        .map_err(|e| PipelineError::task("producer", e))?;

    if let Some(reporter_stop) = reporter_stop {
        reporter_stop.request_stop();
    }
    let published = match reporter {
        Some(handle) => handle.await.map_err(|e| PipelineError::task("reporter", e))??,
        None => 0,
    };

    if let Some(e) = failure {
        return Err(e);
    }

    let mut summary = RunSummary::new(started_at, elapsed);
    summary.records_merged = producer.merged;
    summary.events_published = published;
    summary.cancelled = producer.cancelled || stop.is_stop_requested();
    summary.feeds = producer.feeds;
    summary.records_applied = reports.iter().map(|r| r.records).sum();
    summary.top_changes = reports.iter().map(|r| r.changes).sum();
    summary.extend_symbols(reports.iter().flat_map(|r| r.books.iter()));

    tracing::info!(
        records = summary.records_merged,
        applied = summary.records_applied,
        changes = summary.top_changes,
        events = summary.events_published,
        symbols = summary.symbols.len(),
        elapsed_ms = summary.elapsed_ms,
        "Pipeline finished"
    );
    Ok(summary)
}
