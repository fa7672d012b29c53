//! Line parser for `HH:MM:SS.mmm,SYMBOL,bid,bidSize,ask,askSize` records

use super::{FeedId, Record, Symbol, SymbolError, TimeParseError, TimePoint};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Number of fields in a record line
pub const FIELD_COUNT: usize = 6;

/// Reasons a line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("line starts with whitespace")]
    LeadingWhitespace,
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),
    #[error(transparent)]
    Time(#[from] TimeParseError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error("invalid {field} price {value:?}")]
    Price { field: &'static str, value: String },
    #[error("invalid {field} size {value:?}")]
    Size { field: &'static str, value: String },
}

/// Parses record lines for one feed
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    feed_id: FeedId,
    separator: char,
}

impl RecordParser {
    pub fn new(feed_id: FeedId, separator: char) -> Self {
        Self { feed_id, separator }
    }

    pub fn feed_id(&self) -> FeedId {
        self.feed_id
    }

    /// Parse one line into a record stamped with `received_at`
    pub fn parse(&self, line: &str, received_at: Instant) -> Result<Record, ParseError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match line.chars().next() {
            None => return Err(ParseError::Empty),
            Some(c) if c.is_whitespace() => return Err(ParseError::LeadingWhitespace),
            Some(_) => {}
        }

        let mut fields = [""; FIELD_COUNT];
        let mut count = 0;
        for field in line.split(self.separator) {
            if count < FIELD_COUNT {
                fields[count] = field;
            }
            count += 1;
        }
        if count != FIELD_COUNT {
            return Err(ParseError::FieldCount(count));
        }

        let [time, symbol, bid, bid_size, ask, ask_size] = fields;

        Ok(Record {
            feed_id: self.feed_id,
            time: TimePoint::parse(time)?,
            symbol: Symbol::new(symbol)?,
            bid: parse_price("bid", bid)?,
            bid_size: parse_size("bid", bid_size)?,
            ask: parse_price("ask", ask)?,
            ask_size: parse_size("ask", ask_size)?,
            received_at,
        })
    }

    /// Whether a line looks like a column header rather than data
    ///
    /// The first field must be a name: non-empty and free of digits. A
    /// mistyped time such as `9:00:00.007` is data and gets rejected.
    pub fn is_header(&self, line: &str) -> bool {
        let first = line.split(self.separator).next().unwrap_or_default().trim();
        !first.is_empty() && !first.bytes().any(|b| b.is_ascii_digit())
    }
}

fn parse_price(field: &'static str, value: &str) -> Result<Decimal, ParseError> {
    Decimal::from_str(value)
        .ok()
        .filter(|price| !price.is_sign_negative())
        .ok_or_else(|| ParseError::Price {
            field,
            value: value.to_string(),
        })
}

fn parse_size(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse::<u64>().map_err(|_| ParseError::Size {
        field,
        value: value.to_string(),
    })
}
