//! Top of book event sinks

use crate::config::EventFormat;
use crate::orderbook::TopOfBook;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Destination for composite top of book changes
#[async_trait]
pub trait TopOfBookSink: Send {
    /// Write one event
    async fn publish(&mut self, event: &TopOfBook) -> anyhow::Result<()>;
    /// Flush anything buffered; called once after the last event
    async fn finish(&mut self) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: TopOfBookSink + ?Sized> TopOfBookSink for Box<T> {
    async fn publish(&mut self, event: &TopOfBook) -> anyhow::Result<()> {
        (**self).publish(event).await
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        (**self).finish().await
    }
}

/// Writes one event per line to any async writer
pub struct WriterSink<W: AsyncWrite + Unpin + Send> {
    writer: BufWriter<W>,
    format: EventFormat,
    line: String,
}

impl WriterSink<tokio::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout(format: EventFormat) -> Self {
        Self::new(tokio::io::stdout(), format)
    }
}

impl<W: AsyncWrite + Unpin + Send> WriterSink<W> {
    pub fn new(writer: W, format: EventFormat) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format,
            line: String::with_capacity(64),
        }
    }

    /// Unwrap the underlying writer; buffered bytes are lost unless `finish` ran
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> TopOfBookSink for WriterSink<W> {
    async fn publish(&mut self, event: &TopOfBook) -> anyhow::Result<()> {
        use std::fmt::Write;

        self.line.clear();
        match self.format {
            EventFormat::Csv => write!(self.line, "{event}")?,
            EventFormat::Json => self.line.push_str(&serde_json::to_string(event)?),
        }
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes()).await?;
        Ok(())
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Keeps every event in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<TopOfBook>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far
    pub fn events(&self) -> Vec<TopOfBook> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TopOfBookSink for CollectingSink {
    async fn publish(&mut self, event: &TopOfBook) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("event buffer poisoned"))?
            .push(*event);
        Ok(())
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Drops events, counting them
#[derive(Debug, Default)]
pub struct DiscardSink {
    pub discarded: u64,
}

#[async_trait]
impl TopOfBookSink for DiscardSink {
    async fn publish(&mut self, _event: &TopOfBook) -> anyhow::Result<()> {
        self.discarded += 1;
        Ok(())
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
