//! Output: top of book event sinks and the end of run summary

mod sink;
mod summary;

pub use sink::{CollectingSink, DiscardSink, TopOfBookSink, WriterSink};
pub use summary::{RunSummary, SymbolSummary};
