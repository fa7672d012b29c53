//! Read-ahead cursor over one feed

use super::{FeedId, LineSource, ParseError, Record, RecordParser, TimePoint};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How the first line of a feed is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    /// Skip the first line only if it does not start with a timestamp
    #[default]
    Auto,
    /// The first line is always a header
    Present,
    /// Every line is data
    Absent,
}

/// Per-feed ingestion counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub feed_id: FeedId,
    pub name: String,
    /// Lines pulled from the source
    pub lines_read: u64,
    /// Records handed to the merger
    pub records: u64,
    /// Lines dropped as malformed
    pub rejected: u64,
    /// Whether a header line was skipped
    pub header_skipped: bool,
    /// Records older than their predecessor on the same feed
    pub out_of_order: u64,
}

/// Lazily pulls and caches one record ahead from a line source
pub struct FeedCursor<S> {
    source: S,
    parser: RecordParser,
    header: HeaderPolicy,
    at_start: bool,
    line: String,
    cache: Option<Record>,
    last_time: TimePoint,
    stats: FeedStats,
}

impl<S: LineSource> FeedCursor<S> {
    pub fn new(feed_id: FeedId, source: S, separator: char, header: HeaderPolicy) -> Self {
        let stats = FeedStats {
            feed_id,
            name: source.name(),
            ..Default::default()
        };
        Self {
            source,
            parser: RecordParser::new(feed_id, separator),
            header,
            at_start: true,
            line: String::with_capacity(128),
            cache: None,
            last_time: TimePoint::default(),
            stats,
        }
    }

    pub fn feed_id(&self) -> FeedId {
        self.parser.feed_id()
    }

    /// Whether this feed can still produce records
    pub fn is_valid(&self) -> bool {
        self.cache.is_some() || self.source.is_valid()
    }

    /// Peek at the next record, reading ahead if nothing is cached
    ///
    /// Malformed lines are dropped and counted until a record parses, so
    /// `None` means the source is exhausted or has failed.
    pub fn try_peek(&mut self) -> Option<&Record> {
        if self.cache.is_none() && self.source.is_valid() {
            self.fill_cache();
        }
        self.cache.as_ref()
    }

    /// Remove and return the cached record
    pub fn take(&mut self) -> Option<Record> {
        self.cache.take()
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Read lines until one parses into a record or the source runs out.
    /// A skipped header and malformed lines are consumed along the way.
    fn fill_cache(&mut self) {
        while self.cache.is_none() {
            if !self.source.read_line(&mut self.line) {
                tracing::info!(
                    feed_id = self.feed_id(),
                    feed = %self.stats.name,
                    records = self.stats.records,
                    rejected = self.stats.rejected,
                    "Feed exhausted"
                );
                return;
            }
            self.stats.lines_read += 1;

            if std::mem::take(&mut self.at_start) && self.skip_header() {
                tracing::debug!(feed_id = self.feed_id(), header = %self.line, "Skipping feed header");
                self.stats.header_skipped = true;
                continue;
            }

            match self.parser.parse(&self.line, Instant::now()) {
                Ok(record) => {
                    if record.time < self.last_time {
                        self.stats.out_of_order += 1;
                        tracing::warn!(
                            feed_id = self.feed_id(),
                            time = %record.time,
                            previous = %self.last_time,
                            "Feed record older than its predecessor"
                        );
                    }
                    self.last_time = record.time;
                    self.stats.records += 1;
                    self.cache = Some(record);
                }
                Err(e) => self.reject(e),
            }
        }
    }

    fn skip_header(&self) -> bool {
        match self.header {
            HeaderPolicy::Auto => self.parser.is_header(&self.line),
            HeaderPolicy::Present => true,
            HeaderPolicy::Absent => false,
        }
    }

    fn reject(&mut self, error: ParseError) {
        self.stats.rejected += 1;
        crate::telemetry::record_rejected_line(self.feed_id());
        tracing::warn!(
            feed_id = self.feed_id(),
            line_no = self.stats.lines_read,
            line = %self.line,
            error = %error,
            "Dropping malformed record"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemorySource;

    fn cursor(lines: &[&str], header: HeaderPolicy) -> FeedCursor<MemorySource> {
        FeedCursor::new(
            1,
            MemorySource::new("test", lines.iter().copied()),
            ',',
            header,
        )
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let mut c = cursor(&["09:00:00.007,SPY,205.24,1138,205.25,406"], HeaderPolicy::Absent);
        let first = *c.try_peek().unwrap();
        let again = *c.try_peek().unwrap();
        assert_eq!(first, again);
        assert_eq!(c.stats().lines_read, 1);

        let taken = c.take().unwrap();
        assert_eq!(taken.feed_id, 1);
        assert!(c.take().is_none());
    }

    #[test]
    fn test_valid_while_cached() {
        let mut c = cursor(&["09:00:00.007,SPY,205.24,1138,205.25,406"], HeaderPolicy::Absent);
        assert!(c.try_peek().is_some());
        assert!(c.is_valid());
        c.take();
        assert!(c.is_valid());
        assert!(c.try_peek().is_none());
        assert!(!c.is_valid());
    }

    #[test]
    fn test_malformed_line_skipped_within_peek() {
        let mut c = cursor(
            &["garbage", "09:00:00.007,SPY,205.24,1138,205.25,406"],
            HeaderPolicy::Absent,
        );
        assert_eq!(c.try_peek().unwrap().time.to_string(), "09:00:00.007");
        assert!(c.is_valid());
        assert_eq!(c.stats().rejected, 1);
        assert_eq!(c.stats().lines_read, 2);
    }

    #[test]
    fn test_only_malformed_lines_exhaust_feed() {
        let mut c = cursor(&["garbage", "", "09:00:00.007,SPY"], HeaderPolicy::Absent);
        assert!(c.try_peek().is_none());
        assert!(!c.is_valid());
        assert_eq!(c.stats().rejected, 3);
    }

    #[test]
    fn test_auto_header_skipped_once() {
        let mut c = cursor(
            &[
                "time,symbol,bid,bid_size,ask,ask_size",
                "09:00:00.007,SPY,205.24,1138,205.25,406",
                "time,symbol,bid,bid_size,ask,ask_size",
            ],
            HeaderPolicy::Auto,
        );
        assert_eq!(c.try_peek().unwrap().time.to_string(), "09:00:00.007");
        assert!(c.stats().header_skipped);
        assert!(c.take().is_some());
        // A header-like line later in the stream is an ordinary reject
        assert!(c.try_peek().is_none());
        assert_eq!(c.stats().rejected, 1);
    }

    #[test]
    fn test_auto_header_absent() {
        let mut c = cursor(&["09:00:00.007,SPY,205.24,1138,205.25,406"], HeaderPolicy::Auto);
        assert!(c.try_peek().is_some());
        assert!(!c.stats().header_skipped);
    }

    #[test]
    fn test_auto_malformed_first_line_rejected() {
        let mut c = cursor(
            &[
                "9:00:00.006,SPY,205.24,1138,205.25,406",
                "09:00:00.007,SPY,205.24,1138,205.25,406",
            ],
            HeaderPolicy::Auto,
        );
        assert_eq!(c.try_peek().unwrap().time.to_string(), "09:00:00.007");
        assert!(!c.stats().header_skipped);
        assert_eq!(c.stats().rejected, 1);
    }

    #[test]
    fn test_present_header_always_skipped() {
        let mut c = cursor(
            &[
                "09:00:00.006,SPY,205.24,1138,205.25,406",
                "09:00:00.007,SPY,205.24,1138,205.25,406",
            ],
            HeaderPolicy::Present,
        );
        assert_eq!(c.try_peek().unwrap().time.to_string(), "09:00:00.007");
        assert!(c.stats().header_skipped);
    }

    #[test]
    fn test_out_of_order_counted() {
        let mut c = cursor(
            &[
                "09:00:00.009,SPY,205.24,1138,205.25,406",
                "09:00:00.008,SPY,205.24,1138,205.25,406",
            ],
            HeaderPolicy::Absent,
        );
        assert!(c.try_peek().is_some());
        c.take();
        assert!(c.try_peek().is_some());
        assert_eq!(c.stats().out_of_order, 1);
        assert_eq!(c.stats().records, 2);
    }
}
