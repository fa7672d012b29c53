//! Reporter task: drains top of book changes into a sink

use super::lane::Published;
use super::queue::{Popped, QueueReceiver};
use super::PipelineError;
use crate::report::TopOfBookSink;
use crate::telemetry::{self, CounterMetric, LatencyMetric};

/// Publish every queued change until the queue is stopped or closed
///
/// Returns the number of events written.
pub async fn run_reporter<S: TopOfBookSink>(
    mut sink: S,
    mut rx: QueueReceiver<Published>,
) -> Result<u64, PipelineError> {
    let mut published = 0u64;
    while let Popped::Item(item) = rx.pop().await {
        sink.publish(&item.event)
            .await
            .map_err(|e| PipelineError::Sink(format!("{e:#}")))?;
        telemetry::record_latency(LatencyMetric::Publication, item.queued_at.elapsed());
        published += 1;
    }
    sink.finish()
        .await
        .map_err(|e| PipelineError::Sink(format!("{e:#}")))?;
    telemetry::increment(CounterMetric::Published, published);
    tracing::debug!(published, "Reporter finished");
    Ok(published)
}
