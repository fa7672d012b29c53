//! Multi-feed merge over real files

use crate::common::{file_merger, write_feeds, FEED_A, FEED_B, FEED_C};
use quote_consolidator::feed::{FeedId, Record};

#[test]
fn test_files_merge_in_time_order() {
    let (_dir, paths) = write_feeds(&[FEED_A, FEED_B, FEED_C]);
    let mut merger = file_merger(&paths);
    let records: Vec<Record> = merger.by_ref().collect();

    assert_eq!(records.len(), FEED_A.len() + FEED_B.len() + FEED_C.len() - 1);
    assert!(records.windows(2).all(|w| w[0].time <= w[1].time));
    assert!(merger.is_finished());
    assert_eq!(merger.emitted(), records.len() as u64);
}

#[test]
fn test_equal_times_go_to_lowest_feed() {
    let (_dir, paths) = write_feeds(&[FEED_A, FEED_B, FEED_C]);
    let feeds: Vec<FeedId> = file_merger(&paths).map(|r| r.feed_id).collect();
    assert_eq!(feeds, vec![0, 1, 1, 2, 0, 0, 1, 0, 2, 2, 2, 0, 1]);
}

#[test]
fn test_feed_counters() {
    let (_dir, paths) = write_feeds(&[FEED_A, FEED_B, FEED_C]);
    let mut merger = file_merger(&paths);
    let _ = merger.by_ref().count();

    let stats = merger.feed_stats();
    assert_eq!(stats.len(), 3);
    assert!(stats.iter().all(|s| s.header_skipped));
    assert_eq!(stats[0].records, FEED_A.len() as u64);
    assert_eq!(stats[1].records, FEED_B.len() as u64);
    assert_eq!(stats[2].records, FEED_C.len() as u64 - 1);
    assert_eq!(stats[2].rejected, 1);
    assert!(stats[2].name.ends_with("feed_2.csv"));
}

#[test]
fn test_empty_and_missing_files() {
    let (_dir, paths) = write_feeds(&[FEED_A, &[]]);
    let records: Vec<Record> = file_merger(&paths).collect();
    assert_eq!(records.len(), FEED_A.len());

    assert!(quote_consolidator::feed::FileSource::open("/nonexistent/feed.csv").is_err());
}
