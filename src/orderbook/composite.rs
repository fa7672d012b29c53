//! Composite book merging every feed's quote for one symbol

use super::{BookStatistics, FeedBook, Level, Side, TopLevelAggregator};
use crate::feed::{FeedId, Record, Symbol, TimePoint};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Composite top of book published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopOfBook {
    /// Exchange time of the record that caused the change
    pub time: TimePoint,
    pub symbol: Symbol,
    pub bid: Level,
    pub ask: Level,
}

impl TopOfBook {
    /// Whether the aggregate bid meets or exceeds the aggregate ask
    pub fn is_crossed(&self) -> bool {
        self.bid.size > 0 && self.ask.size > 0 && self.bid.price >= self.ask.price
    }
}

impl fmt::Display for TopOfBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.time, self.symbol, self.bid.price, self.bid.size, self.ask.price, self.ask.size
        )
    }
}

/// Incremental aggregate disagrees with a full recomputation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{symbol} {side} aggregate {incremental:?} but feeds imply {recomputed:?}")]
pub struct ConsistencyError {
    pub symbol: Symbol,
    pub side: Side,
    pub incremental: Level,
    pub recomputed: Level,
}

/// Per-symbol book aggregating the best quotes of every feed
///
/// Not thread safe; one worker owns each book.
#[derive(Debug, Clone)]
pub struct CompositeBook {
    symbol: Symbol,
    feeds: HashMap<FeedId, FeedBook>,
    top: TopLevelAggregator,
    last_change: TimePoint,
    stats: BookStatistics,
}

impl CompositeBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            feeds: HashMap::new(),
            top: TopLevelAggregator::new(),
            last_change: TimePoint::default(),
            stats: BookStatistics::new(symbol),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Time of the last top of book change
    pub fn last_change(&self) -> TimePoint {
        self.last_change
    }

    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            time: self.last_change,
            symbol: self.symbol,
            bid: self.top.bid(),
            ask: self.top.ask(),
        }
    }

    pub fn aggregator(&self) -> &TopLevelAggregator {
        &self.top
    }

    #[cfg(test)]
    pub(crate) fn aggregator_mut(&mut self) -> &mut TopLevelAggregator {
        &mut self.top
    }

    pub fn feed_book(&self, feed_id: FeedId) -> Option<&FeedBook> {
        self.feeds.get(&feed_id)
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    pub fn statistics(&self) -> &BookStatistics {
        &self.stats
    }

    /// Consume the book, returning its statistics
    pub fn into_statistics(self) -> BookStatistics {
        self.stats
    }

    /// Apply a record; returns whether the composite top of book changed
    pub fn update(&mut self, record: &Record) -> bool {
        debug_assert_eq!(record.symbol, self.symbol);
        let old_bid = self.top.bid();
        let old_ask = self.top.ask();
        let feed_id = record.feed_id;

        if !self.feeds.contains_key(&feed_id) {
            if self.feeds.is_empty() {
                // Nothing to merge against yet
                self.top.add(feed_id, Level::new(record.bid, record.bid_size), Side::Bid);
                self.top.add(feed_id, Level::new(record.ask, record.ask_size), Side::Ask);
            }
            tracing::debug!(symbol = %self.symbol, feed_id, "New feed on symbol");
            self.feeds.insert(feed_id, FeedBook::new(self.symbol, feed_id));
        }
        if let Some(book) = self.feeds.get_mut(&feed_id) {
            book.update(record);
        }

        self.merge(Side::Bid, feed_id, Level::new(record.bid, record.bid_size));
        self.merge(Side::Ask, feed_id, Level::new(record.ask, record.ask_size));

        for side in [Side::Bid, Side::Ask] {
            if self.top.count(side) == 0 {
                self.refill(side);
            }
        }

        let changed = self.top.bid() != old_bid || self.top.ask() != old_ask;
        if changed {
            self.last_change = record.time;
            let latency = record.received_at.elapsed();
            self.stats.record_change(
                latency,
                self.top.side(Side::Bid).best(),
                self.top.side(Side::Ask).best(),
            );
            crate::telemetry::record_top_of_book_change(latency);
        }
        changed
    }

    /// Fold one feed's new level into a side of the aggregate
    fn merge(&mut self, side: Side, feed_id: FeedId, level: Level) {
        let aggregate = self.top.side_mut(side);
        if aggregate.contains(feed_id) {
            if side.is_worse(level.price, aggregate.total().price) {
                aggregate.remove(feed_id);
            } else {
                aggregate.add(feed_id, level);
            }
        } else if aggregate.accepts(level.price) {
            aggregate.add(feed_id, level);
        }
    }

    /// Repopulate an emptied side from every feed's latest quote
    fn refill(&mut self, side: Side) {
        let Some(best) = self.best_price(side) else {
            return;
        };
        let aggregate = self.top.side_mut(side);
        for book in self.feeds.values() {
            let level = book.level(side);
            if level.price == best {
                aggregate.add(book.feed_id, level);
            }
        }
    }

    fn best_price(&self, side: Side) -> Option<rust_decimal::Decimal> {
        self.feeds
            .values()
            .map(|book| book.level(side).price)
            .reduce(|best, price| if side.is_better(price, best) { price } else { best })
    }

    /// Recompute one side from scratch over every feed
    pub fn recompute(&self, side: Side) -> Level {
        match self.best_price(side) {
            None => Level::EMPTY,
            Some(best) => {
                let size = self
                    .feeds
                    .values()
                    .map(|book| book.level(side))
                    .filter(|level| level.price == best)
                    .fold(0u64, |acc, level| acc.saturating_add(level.size));
                Level::new(best, size)
            }
        }
    }

    /// Compare the incremental aggregate with a full recomputation
    ///
    /// O(feeds); meant for tests and the opt-in verification mode.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        for side in [Side::Bid, Side::Ask] {
            let incremental = self.top.side(side).total();
            let recomputed = self.recompute(side);
            if incremental != recomputed {
                return Err(ConsistencyError {
                    symbol: self.symbol,
                    side,
                    incremental,
                    recomputed,
                });
            }
        }
        Ok(())
    }
}
