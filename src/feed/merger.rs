//! Oldest-first merge across feeds

use super::{FeedCursor, FeedId, FeedStats, HeaderPolicy, LineSource, Record, TimePoint};

/// Merges independently time-ordered feeds into one time-ordered stream
///
/// Each call scans every live feed, so the cost per record is linear in the
/// number of feeds. Ties on equal timestamps go to the lowest feed id.
pub struct FeedMerger<S> {
    cursors: Vec<FeedCursor<S>>,
    separator: char,
    header: HeaderPolicy,
    emitted: u64,
    finished: bool,
}

impl<S: LineSource> FeedMerger<S> {
    pub fn new(separator: char, header: HeaderPolicy) -> Self {
        Self {
            cursors: Vec::new(),
            separator,
            header,
            emitted: 0,
            finished: false,
        }
    }

    /// Register a feed, returning its assigned id
    pub fn add_source(&mut self, source: S) -> FeedId {
        let feed_id = self.cursors.len() as FeedId;
        tracing::info!(feed_id, feed = %source.name(), "Registered feed");
        self.cursors
            .push(FeedCursor::new(feed_id, source, self.separator, self.header));
        feed_id
    }

    pub fn feed_count(&self) -> usize {
        self.cursors.len()
    }

    /// Number of feeds that can still produce records
    pub fn live_feeds(&self) -> usize {
        self.cursors.iter().filter(|c| c.is_valid()).count()
    }

    /// Records emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Whether every feed has been exhausted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn feed_stats(&self) -> Vec<FeedStats> {
        self.cursors.iter().map(|c| c.stats().clone()).collect()
    }

    /// Next record in time order, `None` once every feed is exhausted
    pub fn next_record(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }

        let mut oldest: Option<(usize, TimePoint)> = None;
        for (idx, cursor) in self.cursors.iter_mut().enumerate() {
            if let Some(record) = cursor.try_peek() {
                if oldest.map_or(true, |(_, time)| record.time < time) {
                    oldest = Some((idx, record.time));
                }
            }
        }

        match oldest {
            Some((idx, _)) => {
                self.emitted += 1;
                self.cursors[idx].take()
            }
            None => {
                self.finished = true;
                tracing::info!(records = self.emitted, "All feeds exhausted");
                None
            }
        }
    }
}

impl<S: LineSource> Iterator for FeedMerger<S> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

impl<S: LineSource> std::iter::FusedIterator for FeedMerger<S> {}
