//! Composite order book module
//!
//! Per-feed top of book, the cross-feed best level aggregator, and the
//! per-symbol composite book that ties them together

mod book;
mod composite;
mod stats;
mod top_level;

pub use book::FeedBook;
pub use composite::{CompositeBook, ConsistencyError, TopOfBook};
pub use stats::BookStatistics;
pub use top_level::{SideAggregate, TopLevelAggregator};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Whether price `a` is strictly better than `b` on this side
    pub fn is_better(self, a: Decimal, b: Decimal) -> bool {
        match self {
            Side::Bid => a > b,
            Side::Ask => a < b,
        }
    }

    /// Whether price `a` is strictly worse than `b` on this side
    pub fn is_worse(self, a: Decimal, b: Decimal) -> bool {
        self.is_better(b, a)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// A price with the quantity quoted at it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    /// Price at this level
    pub price: Decimal,
    /// Total size available
    pub size: u64,
}

impl Level {
    /// The "no quote" sentinel
    pub const EMPTY: Level = Level {
        price: Decimal::ZERO,
        size: 0,
    };

    pub fn new(price: Decimal, size: u64) -> Self {
        Self { price, size }
    }
}
