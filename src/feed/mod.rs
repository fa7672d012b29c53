//! Feed ingestion module
//!
//! Line sources, record parsing, per-feed read-ahead cursors and the
//! time-ordered merge across feeds

mod cursor;
mod merger;
mod parser;
mod source;
mod time;
mod types;

pub use cursor::{FeedCursor, FeedStats, HeaderPolicy};
pub use merger::FeedMerger;
pub use parser::{ParseError, RecordParser, FIELD_COUNT};
pub use source::{FileSource, LineSource, MemorySource};
pub use time::{TimeParseError, TimePoint};
pub use types::{FeedId, Record, Symbol, SymbolError, SYMBOL_CAPACITY};
