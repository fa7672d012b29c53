//! End of run summary and per-symbol statistics report

use crate::feed::{FeedStats, Symbol};
use crate::orderbook::BookStatistics;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

/// Finalized statistics for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSummary {
    pub symbol: Symbol,
    pub update_count: u64,
    pub avg_latency_us: f64,
    pub min_latency_us: u64,
    pub median_latency_us: u64,
    pub p99_latency_us: u64,
    pub max_latency_us: u64,
    pub min_bid: Option<Decimal>,
    pub max_ask: Option<Decimal>,
}

impl From<&BookStatistics> for SymbolSummary {
    fn from(stats: &BookStatistics) -> Self {
        Self {
            symbol: stats.symbol(),
            update_count: stats.update_count(),
            avg_latency_us: stats.avg_latency_us(),
            min_latency_us: stats.min_latency_us(),
            median_latency_us: stats.median_latency_us(),
            p99_latency_us: stats.percentile_us(0.99),
            max_latency_us: stats.max_latency_us(),
            min_bid: stats.min_bid(),
            max_ask: stats.max_ask(),
        }
    }
}

/// Everything reported once all feeds are exhausted
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Wall clock start of the run
    pub started_at: DateTime<Utc>,
    /// Wall time from start to the last book update
    pub elapsed_ms: u64,
    /// Records emitted by the merger
    pub records_merged: u64,
    /// Records applied to books across all lanes
    pub records_applied: u64,
    /// Top of book changes detected across all lanes
    pub top_changes: u64,
    /// Top of book changes handed to the sink
    pub events_published: u64,
    /// Whether the run stopped before the feeds were exhausted
    pub cancelled: bool,
    /// Per-feed reading counters, in feed id order
    pub feeds: Vec<FeedStats>,
    /// Per-symbol statistics, sorted by symbol
    pub symbols: Vec<SymbolSummary>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            started_at,
            elapsed_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
            records_merged: 0,
            records_applied: 0,
            top_changes: 0,
            events_published: 0,
            cancelled: false,
            feeds: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Add book statistics, keeping symbols sorted
    pub fn extend_symbols<'a>(&mut self, stats: impl IntoIterator<Item = &'a BookStatistics>) {
        self.symbols.extend(stats.into_iter().map(SymbolSummary::from));
        self.symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolSummary> {
        self.symbols.iter().find(|s| s.symbol.as_str() == symbol)
    }

    /// Total lines rejected across feeds
    pub fn rejected_lines(&self) -> u64 {
        self.feeds.iter().map(|f| f.rejected).sum()
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"
══════════════════════════════════════════════════════════════════════════════════
               BOOK STATISTICS
══════════════════════════════════════════════════════════════════════════════════

RUN
──────────────────────────────────────────────────────────────────────────────────
Started:          {}
Elapsed:          {} ms
Records Merged:   {}
Records Applied:  {}
Top Changes:      {}
Events Published: {}
Lines Rejected:   {}{}

FEEDS
──────────────────────────────────────────────────────────────────────────────────
"#,
            self.started_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            self.elapsed_ms,
            self.records_merged,
            self.records_applied,
            self.top_changes,
            self.events_published,
            self.rejected_lines(),
            if self.cancelled { "\nStatus:           cancelled" } else { "" },
        );

        let _ = writeln!(
            out,
            "{:>4}  {:<30} {:>10} {:>10} {:>9} {:>12}",
            "ID", "SOURCE", "LINES", "RECORDS", "REJECTED", "OUT OF ORDER"
        );
        for feed in &self.feeds {
            let _ = writeln!(
                out,
                "{:>4}  {:<30} {:>10} {:>10} {:>9} {:>12}",
                feed.feed_id, feed.name, feed.lines_read, feed.records, feed.rejected, feed.out_of_order
            );
        }

        let _ = write!(
            out,
            "\nSYMBOLS\n──────────────────────────────────────────────────────────────────────────────────\n"
        );
        let _ = writeln!(
            out,
            "{:<8} {:>9} {:>10} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10}",
            "SYMBOL", "UPDATES", "AVG (us)", "MIN", "MEDIAN", "P99", "MAX", "MIN BID", "MAX ASK"
        );
        for s in &self.symbols {
            let _ = writeln!(
                out,
                "{:<8} {:>9} {:>10.2} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10}",
                s.symbol.as_str(),
                s.update_count,
                s.avg_latency_us,
                s.min_latency_us,
                s.median_latency_us,
                s.p99_latency_us,
                s.max_latency_us,
                display_price(s.min_bid),
                display_price(s.max_ask),
            );
        }
        out.push_str("══════════════════════════════════════════════════════════════════════════════════\n");
        out
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn display_price(price: Option<Decimal>) -> String {
    price.map_or_else(|| "-".to_string(), |p| p.to_string())
}
