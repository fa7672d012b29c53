//! Per-symbol top of book statistics

use super::Level;
use crate::feed::Symbol;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

/// Extremes and change latency for one symbol's composite book
///
/// Latencies are kept in microseconds, from a record's receipt to the top of
/// book change it caused. The history stays sorted so percentiles can be
/// read at any point of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStatistics {
    symbol: Symbol,
    min_bid: Option<Decimal>,
    max_ask: Option<Decimal>,
    update_count: u64,
    avg_latency_us: f64,
    #[serde(skip)]
    latencies_us: Vec<u64>,
}

impl BookStatistics {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            min_bid: None,
            max_ask: None,
            update_count: 0,
            avg_latency_us: 0.0,
            latencies_us: Vec::new(),
        }
    }

    /// Account for one top of book change
    pub fn record_change(&mut self, latency: Duration, bid: Option<Level>, ask: Option<Level>) {
        self.update_count += 1;

        let sample = latency.as_micros().min(u64::MAX as u128) as u64;
        self.avg_latency_us += (sample as f64 - self.avg_latency_us) / self.update_count as f64;
        let idx = self.latencies_us.partition_point(|us| *us <= sample);
        self.latencies_us.insert(idx, sample);

        if let Some(bid) = bid {
            if self.min_bid.map_or(true, |min| bid.price < min) {
                self.min_bid = Some(bid.price);
            }
        }
        if let Some(ask) = ask {
            if self.max_ask.map_or(true, |max| ask.price > max) {
                self.max_ask = Some(ask.price);
            }
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Lowest best bid observed at a top of book change
    pub fn min_bid(&self) -> Option<Decimal> {
        self.min_bid
    }

    /// Highest best ask observed at a top of book change
    pub fn max_ask(&self) -> Option<Decimal> {
        self.max_ask
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Mean change latency in microseconds
    pub fn avg_latency_us(&self) -> f64 {
        self.avg_latency_us
    }

    /// Latency history in ascending order
    pub fn latency_samples(&self) -> &[u64] {
        &self.latencies_us
    }

    pub fn min_latency_us(&self) -> u64 {
        self.percentile_us(0.0)
    }

    pub fn median_latency_us(&self) -> u64 {
        self.percentile_us(0.5)
    }

    pub fn max_latency_us(&self) -> u64 {
        self.percentile_us(1.0)
    }

    /// Nearest-rank latency percentile, `q` in `[0, 1]`; 0 without samples
    pub fn percentile_us(&self, q: f64) -> u64 {
        if self.latencies_us.is_empty() {
            return 0;
        }
        let last = self.latencies_us.len() - 1;
        let idx = if q >= 1.0 {
            last
        } else {
            ((self.latencies_us.len() as f64 * q.max(0.0)) as usize).min(last)
        };
        self.latencies_us[idx]
    }
}
