//! Per-feed top of book

use super::{Level, Side};
use crate::feed::{FeedId, Record, Symbol, TimePoint};

/// One feed's latest best bid and ask for a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBook {
    /// Symbol identifier
    pub symbol: Symbol,
    /// Feed this book mirrors
    pub feed_id: FeedId,
    /// Best bid as last reported
    pub bid: Level,
    /// Best ask as last reported
    pub ask: Level,
    /// Exchange time of the last update
    pub updated_at: TimePoint,
}

impl FeedBook {
    /// Create an empty book for a feed
    pub fn new(symbol: Symbol, feed_id: FeedId) -> Self {
        Self {
            symbol,
            feed_id,
            bid: Level::EMPTY,
            ask: Level::EMPTY,
            updated_at: TimePoint::default(),
        }
    }

    /// Replace both sides with the record's quote
    pub fn update(&mut self, record: &Record) {
        debug_assert_eq!(record.feed_id, self.feed_id);
        self.bid = Level::new(record.bid, record.bid_size);
        self.ask = Level::new(record.ask, record.ask_size);
        self.updated_at = record.time;
    }

    /// Level on the given side
    pub fn level(&self, side: Side) -> Level {
        match side {
            Side::Bid => self.bid,
            Side::Ask => self.ask,
        }
    }

    /// Whether the feed's own quote is locked or crossed
    pub fn is_crossed(&self) -> bool {
        self.bid.price >= self.ask.price
    }
}
