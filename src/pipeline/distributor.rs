//! Routes merged records to worker lanes by symbol

use super::lane::LaneMessage;
use super::queue::QueueSender;
use crate::feed::{Record, Symbol};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Symbol-affine fan-out: every record of a symbol lands on the same lane
pub struct Distributor {
    lanes: Vec<QueueSender<LaneMessage>>,
    dispatched: u64,
}

impl Distributor {
    pub fn new(lanes: Vec<QueueSender<LaneMessage>>) -> Self {
        debug_assert!(!lanes.is_empty(), "distributor needs at least one lane");
        Self { lanes, dispatched: 0 }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Records handed to lanes so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Lane index for a symbol
    pub fn lane_for(&self, symbol: &Symbol) -> usize {
        lane_index(symbol, self.lanes.len())
    }

    /// Queue a record on its symbol's lane; false if that lane is gone
    pub fn dispatch(&mut self, record: Record) -> bool {
        let lane = self.lane_for(&record.symbol);
        let delivered = self.lanes[lane].push(LaneMessage::Record(record));
        if delivered {
            self.dispatched += 1;
        } else {
            tracing::warn!(lane, symbol = %record.symbol, "Lane closed, record dropped");
        }
        delivered
    }

    /// Send exactly one end of stream marker to every lane
    pub fn finish(self) {
        for (lane, sender) in self.lanes.into_iter().enumerate() {
            if !sender.push(LaneMessage::EndOfStream) {
                tracing::debug!(lane, "Lane already closed at end of stream");
            }
        }
    }
}

/// Stable symbol to lane mapping
pub fn lane_index(symbol: &Symbol, lanes: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    symbol.hash(&mut hasher);
    (hasher.finish() % lanes.max(1) as u64) as usize
}
