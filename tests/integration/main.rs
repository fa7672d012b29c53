//! Integration tests

mod common;
mod config_test;
mod merge_test;
mod pipeline_test;
