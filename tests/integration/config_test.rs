//! Configuration file tests

use quote_consolidator::config::{Config, EventFormat, StatsFormat};
use quote_consolidator::feed::HeaderPolicy;

#[test]
fn test_config_example_matches_defaults() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();
    let defaults = Config::default();

    assert_eq!(config.feed.separator, defaults.feed.separator);
    assert_eq!(config.feed.header, HeaderPolicy::Auto);
    assert_eq!(config.pipeline.worker_lanes, defaults.pipeline.worker_lanes);
    assert_eq!(config.pipeline.poll_interval_ms, defaults.pipeline.poll_interval_ms);
    assert_eq!(config.pipeline.verify_books, defaults.pipeline.verify_books);
    assert_eq!(config.report.events, defaults.report.events);
    assert_eq!(config.report.event_format, EventFormat::Csv);
    assert_eq!(config.report.stats_format, StatsFormat::Table);
    assert_eq!(config.telemetry.log_level, defaults.telemetry.log_level);
    assert!(config.telemetry.metrics_port.is_none());
}
