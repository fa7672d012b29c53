//! quote-consolidator: composite top of book across independent quote feeds
//!
//! This library provides:
//! - Time-ordered merging of any number of per-feed quote files
//! - Per-symbol composite books aggregating each feed's best bid and ask
//! - A concurrent pipeline with symbol-affine worker lanes
//! - Top of book event sinks and end of run statistics
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod orderbook;
pub mod pipeline;
pub mod report;
pub mod telemetry;
