//! Run command implementation

use crate::config::{Config, EventFormat, StatsFormat};
use crate::feed::{FeedMerger, FileSource};
use crate::pipeline::{self, StopHandle};
use crate::report::{TopOfBookSink, WriterSink};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Feed files; feed ids follow argument order starting at 0
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of book worker lanes
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub lanes: Option<u16>,

    /// Top of book event format
    #[arg(long, value_enum)]
    pub event_format: Option<EventFormat>,

    /// Statistics format
    #[arg(long, value_enum)]
    pub stats_format: Option<StatsFormat>,

    /// Do not print top of book events
    #[arg(long)]
    pub no_events: bool,

    /// Check every book against a full recomputation after each update
    #[arg(long)]
    pub verify: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl RunArgs {
    /// Fold command line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(lanes) = self.lanes {
            config.pipeline.worker_lanes = usize::from(lanes);
        }
        if let Some(format) = self.event_format {
            config.report.event_format = format;
        }
        if let Some(format) = self.stats_format {
            config.report.stats_format = format;
        }
        if self.no_events {
            config.report.events = false;
        }
        if self.verify {
            config.pipeline.verify_books = true;
        }
        if let Some(path) = &self.log_file {
            config.telemetry.log_file = Some(path.clone());
        }
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut merger = FeedMerger::new(config.feed.separator, config.feed.header);
        for path in &self.files {
            let source = FileSource::open(path)
                .with_context(|| format!("Failed to open feed {}", path.display()))?;
            merger.add_source(source);
        }

        let stop = StopHandle::new();
        let ctrl_c_stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping");
                ctrl_c_stop.request_stop();
            }
        });

        let sink: Option<Box<dyn TopOfBookSink>> = if config.report.events {
            Some(Box::new(WriterSink::stdout(config.report.event_format)))
        } else {
            None
        };

        let summary = pipeline::run(merger, sink, &config.pipeline, stop).await?;

        match config.report.stats_format {
            StatsFormat::Table => println!("{}", summary.format_table()),
            StatsFormat::Json => println!("{}", summary.to_json()?),
        }
        if summary.cancelled {
            tracing::warn!("Run cancelled before all feeds were drained");
        }
        Ok(())
    }
}
