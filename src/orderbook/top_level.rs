//! Best-level aggregation across feeds
//!
//! Each side keeps only the feeds quoting the current best price. Every
//! contributor on a side shares one price, and the side total is that price
//! with the summed size.

use super::{Level, Side};
use crate::feed::FeedId;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Feeds at the best price on one side, with their summed size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideAggregate {
    side: Side,
    contributors: BTreeMap<FeedId, Level>,
    total: Level,
}

impl SideAggregate {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            contributors: BTreeMap::new(),
            total: Level::EMPTY,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Aggregate level, `Level::EMPTY` when no feed contributes
    pub fn total(&self) -> Level {
        self.total
    }

    /// Aggregate level, `None` when no feed contributes
    pub fn best(&self) -> Option<Level> {
        (!self.contributors.is_empty()).then_some(self.total)
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Whether the feed is one of the contributors
    pub fn contains(&self, feed_id: FeedId) -> bool {
        self.contributors.contains_key(&feed_id)
    }

    /// Contributors in feed id order
    pub fn contributors(&self) -> impl Iterator<Item = (FeedId, Level)> + '_ {
        self.contributors.iter().map(|(id, level)| (*id, *level))
    }

    /// Whether a quote at `price` would join the aggregate
    ///
    /// An empty side accepts any price.
    pub fn accepts(&self, price: Decimal) -> bool {
        self.is_empty() || !self.side.is_worse(price, self.total.price)
    }

    /// Add or replace a feed's contribution
    ///
    /// Contributors quoting a worse price than `level` are evicted. Callers
    /// only add levels that `accepts` admits, which keeps a single price.
    pub fn add(&mut self, feed_id: FeedId, level: Level) {
        debug_assert!(
            self.contains(feed_id) || self.accepts(level.price),
            "{} level {:?} worse than aggregate {:?}",
            self.side,
            level,
            self.total
        );
        self.contributors.insert(feed_id, level);
        self.evict_stale(level.price);
        self.recompute();
    }

    /// Drop a feed's contribution
    pub fn remove(&mut self, feed_id: FeedId) -> Option<Level> {
        let removed = self.contributors.remove(&feed_id);
        if removed.is_some() {
            self.recompute();
        }
        removed
    }

    fn evict_stale(&mut self, best: Decimal) {
        let side = self.side;
        self.contributors
            .retain(|_, level| !side.is_worse(level.price, best));
    }

    fn recompute(&mut self) {
        let mut levels = self.contributors.values();
        self.total = match levels.next() {
            None => Level::EMPTY,
            Some(first) => {
                let size = levels.fold(first.size, |acc, level| {
                    debug_assert_eq!(level.price, first.price, "mixed prices on {}", self.side);
                    acc.saturating_add(level.size)
                });
                Level::new(first.price, size)
            }
        };
    }
}

/// Aggregated best bid and best ask for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelAggregator {
    bid: SideAggregate,
    ask: SideAggregate,
}

impl Default for TopLevelAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TopLevelAggregator {
    pub fn new() -> Self {
        Self {
            bid: SideAggregate::new(Side::Bid),
            ask: SideAggregate::new(Side::Ask),
        }
    }

    /// Aggregate best bid
    pub fn bid(&self) -> Level {
        self.bid.total()
    }

    /// Aggregate best ask
    pub fn ask(&self) -> Level {
        self.ask.total()
    }

    pub fn side(&self, side: Side) -> &SideAggregate {
        match side {
            Side::Bid => &self.bid,
            Side::Ask => &self.ask,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideAggregate {
        match side {
            Side::Bid => &mut self.bid,
            Side::Ask => &mut self.ask,
        }
    }

    pub fn add(&mut self, feed_id: FeedId, level: Level, side: Side) {
        self.side_mut(side).add(feed_id, level);
    }

    pub fn remove(&mut self, feed_id: FeedId, side: Side) -> Option<Level> {
        self.side_mut(side).remove(feed_id)
    }

    /// Whether a feed currently contributes to a side
    pub fn involves(&self, feed_id: FeedId, side: Side) -> bool {
        self.side(side).contains(feed_id)
    }

    /// Number of contributors on a side
    pub fn count(&self, side: Side) -> usize {
        self.side(side).len()
    }
}
