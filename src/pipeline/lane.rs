//! Worker lane: owns the composite books of the symbols routed to it

use super::queue::{Popped, QueueReceiver, QueueSender};
use super::PipelineError;
use crate::feed::{Record, Symbol};
use crate::orderbook::{BookStatistics, CompositeBook, ConsistencyError, TopOfBook};
use std::collections::HashMap;
use std::time::Instant;

/// Message on a lane's input queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaneMessage {
    Record(Record),
    /// No more records will follow
    EndOfStream,
}

/// Top of book change on its way to the reporter
#[derive(Debug, Clone, Copy)]
pub struct Published {
    pub event: TopOfBook,
    pub queued_at: Instant,
}

/// What a lane hands back when it is done
#[derive(Debug, Clone)]
pub struct LaneReport {
    pub lane: usize,
    pub records: u64,
    pub changes: u64,
    /// Finalized statistics of every book the lane owned
    pub books: Vec<BookStatistics>,
}

/// Books for one partition of the symbol space
pub struct BookLane {
    id: usize,
    books: HashMap<Symbol, CompositeBook>,
    verify: bool,
    records: u64,
    changes: u64,
}

impl BookLane {
    pub fn new(id: usize, verify: bool) -> Self {
        Self {
            id,
            books: HashMap::new(),
            verify,
            records: 0,
            changes: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn book(&self, symbol: &Symbol) -> Option<&CompositeBook> {
        self.books.get(symbol)
    }

    pub fn symbol_count(&self) -> usize {
        self.books.len()
    }

    /// Apply a record to its symbol's book, returning the new top on change
    pub fn apply(&mut self, record: &Record) -> Result<Option<TopOfBook>, ConsistencyError> {
        self.records += 1;
        let lane = self.id;
        let book = self.books.entry(record.symbol).or_insert_with(|| {
            tracing::debug!(lane, symbol = %record.symbol, "New book");
            CompositeBook::new(record.symbol)
        });
        let changed = book.update(record);
        if self.verify {
            book.check_consistency()?;
        }
        if changed {
            self.changes += 1;
            Ok(Some(book.top_of_book()))
        } else {
            Ok(None)
        }
    }

    pub fn into_report(self) -> LaneReport {
        LaneReport {
            lane: self.id,
            records: self.records,
            changes: self.changes,
            books: self
                .books
                .into_values()
                .map(CompositeBook::into_statistics)
                .collect(),
        }
    }
}

/// Drain a lane's queue until end of stream, stop, or close
pub async fn run_lane(
    mut lane: BookLane,
    mut rx: QueueReceiver<LaneMessage>,
    events: Option<QueueSender<Published>>,
) -> Result<LaneReport, PipelineError> {
    loop {
        match rx.pop().await {
            Popped::Item(LaneMessage::Record(record)) => {
                if let Some(event) = lane.apply(&record)? {
                    if let Some(events) = &events {
                        events.push(Published {
                            event,
                            queued_at: Instant::now(),
                        });
                    }
                }
            }
            Popped::Item(LaneMessage::EndOfStream) => break,
            Popped::Stopped => {
                tracing::info!(lane = lane.id, "Lane stopped on request");
                break;
            }
            Popped::Closed => {
                tracing::warn!(lane = lane.id, "Lane input closed without end of stream");
                break;
            }
        }
    }

    crate::telemetry::set_lane_symbols(lane.id, lane.symbol_count());
    tracing::debug!(
        lane = lane.id,
        records = lane.records,
        changes = lane.changes,
        symbols = lane.symbol_count(),
        "Lane finished"
    );
    Ok(lane.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedId, TimePoint};
    use crate::orderbook::{Level, Side};
    use crate::pipeline::queue::channel;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn quote(feed_id: FeedId, symbol: &str, bid: (Decimal, u64), ask: (Decimal, u64)) -> Record {
        Record::new(
            feed_id,
            TimePoint::parse("10:00:00.000").unwrap(),
            Symbol::new(symbol).unwrap(),
            bid,
            ask,
        )
    }

    #[test]
    fn test_apply_keeps_books_per_symbol() {
        let mut lane = BookLane::new(0, true);
        let top = lane
            .apply(&quote(0, "SPY", (dec!(205.12), 500), (dec!(205.13), 200)))
            .unwrap()
            .unwrap();
        assert_eq!(top.bid, Level::new(dec!(205.12), 500));

        lane.apply(&quote(0, "AAPL", (dec!(150.00), 10), (dec!(150.01), 10)))
            .unwrap();
        assert!(lane
            .apply(&quote(1, "SPY", (dec!(205.11), 100), (dec!(205.14), 100)))
            .unwrap()
            .is_none());

        assert_eq!(lane.symbol_count(), 2);
        let spy = lane.book(&Symbol::new("SPY").unwrap()).unwrap();
        assert_eq!(spy.feed_count(), 2);

        let report = lane.into_report();
        assert_eq!(report.records, 3);
        assert_eq!(report.changes, 2);
        assert_eq!(report.books.len(), 2);
    }

    #[tokio::test]
    async fn test_run_lane_publishes_changes() {
        let (tx, rx) = channel(Duration::from_millis(5));
        let (events_tx, mut events_rx) = channel(Duration::from_millis(5));

        tx.push(LaneMessage::Record(quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))));
        tx.push(LaneMessage::Record(quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))));
        tx.push(LaneMessage::Record(quote(0, "SPY", (dec!(1.00), 2), (dec!(1.01), 1))));
        tx.push(LaneMessage::EndOfStream);

        let report = run_lane(BookLane::new(3, false), rx, Some(events_tx)).await.unwrap();
        assert_eq!(report.lane, 3);
        assert_eq!(report.records, 3);
        assert_eq!(report.changes, 2);

        let mut sizes = Vec::new();
        while let Popped::Item(published) = events_rx.pop().await {
            sizes.push(published.event.bid.size);
        }
        assert_eq!(sizes, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_run_lane_honours_stop() {
        let (tx, rx) = channel::<LaneMessage>(Duration::from_millis(5));
        tx.push(LaneMessage::Record(quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))));
        tx.request_stop();

        let report = run_lane(BookLane::new(0, false), rx, None).await.unwrap();
        assert_eq!(report.records, 1);
        drop(tx);
    }

    #[test]
    fn test_verify_reports_drift() {
        let spy = Symbol::new("SPY").unwrap();
        let mut lane = BookLane::new(0, true);
        lane.apply(&quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))).unwrap();
        lane.books
            .get_mut(&spy)
            .unwrap()
            .aggregator_mut()
            .add(0, Level::new(dec!(1.00), 7), Side::Bid);

        let err = lane
            .apply(&quote(1, "SPY", (dec!(0.99), 1), (dec!(1.02), 1)))
            .unwrap_err();
        assert_eq!(err.side, Side::Bid);
        assert_eq!(err.recomputed, Level::new(dec!(1.00), 1));
    }

    #[tokio::test]
    async fn test_run_lane_fails_on_inconsistent_book() {
        let spy = Symbol::new("SPY").unwrap();
        let mut lane = BookLane::new(2, true);
        lane.apply(&quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))).unwrap();
        lane.books
            .get_mut(&spy)
            .unwrap()
            .aggregator_mut()
            .add(0, Level::new(dec!(1.00), 7), Side::Bid);

        let (tx, rx) = channel(Duration::from_millis(5));
        tx.push(LaneMessage::Record(quote(1, "SPY", (dec!(0.99), 1), (dec!(1.02), 1))));
        tx.push(LaneMessage::EndOfStream);

        let err = run_lane(lane, rx, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Consistency(ConsistencyError { side: Side::Bid, .. })));
    }

    #[tokio::test]
    async fn test_unverified_lane_ignores_drift() {
        let spy = Symbol::new("SPY").unwrap();
        let mut lane = BookLane::new(0, false);
        lane.apply(&quote(0, "SPY", (dec!(1.00), 1), (dec!(1.01), 1))).unwrap();
        lane.books
            .get_mut(&spy)
            .unwrap()
            .aggregator_mut()
            .add(0, Level::new(dec!(1.00), 7), Side::Bid);

        let (tx, rx) = channel(Duration::from_millis(5));
        tx.push(LaneMessage::Record(quote(1, "SPY", (dec!(0.99), 1), (dec!(1.02), 1))));
        tx.push(LaneMessage::EndOfStream);

        let report = run_lane(lane, rx, None).await.unwrap();
        assert_eq!(report.records, 2);
    }
}
