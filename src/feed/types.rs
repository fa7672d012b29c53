//! Quote record types

use super::TimePoint;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Identity of an input feed, assigned in configuration order
pub type FeedId = u16;

/// Maximum symbol length in bytes
pub const SYMBOL_CAPACITY: usize = 8;

/// Invalid symbol token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("empty symbol")]
    Empty,
    #[error("symbol {0:?} longer than 8 bytes")]
    TooLong(String),
    #[error("symbol {0:?} contains non-printable or non-ASCII characters")]
    InvalidCharacter(String),
}

/// Ticker symbol stored inline so records stay `Copy`
///
/// Bytes are zero padded and compared before the length, so the derived
/// ordering is the lexicographic order of the text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    bytes: [u8; SYMBOL_CAPACITY],
    len: u8,
}

impl Symbol {
    pub fn new(token: &str) -> Result<Self, SymbolError> {
        if token.is_empty() {
            return Err(SymbolError::Empty);
        }
        if token.len() > SYMBOL_CAPACITY {
            return Err(SymbolError::TooLong(token.to_string()));
        }
        if !token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(SymbolError::InvalidCharacter(token.to_string()));
        }

        let mut bytes = [0u8; SYMBOL_CAPACITY];
        bytes[..token.len()].copy_from_slice(token.as_bytes());
        Ok(Self {
            bytes,
            len: token.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // Only printable ASCII is ever stored
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<&str> for Symbol {
    type Error = SymbolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A single quote update from one feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Originating feed
    pub feed_id: FeedId,
    /// Exchange time of the quote
    pub time: TimePoint,
    /// Ticker symbol
    pub symbol: Symbol,
    /// Best bid price
    pub bid: Decimal,
    /// Size at the best bid
    pub bid_size: u64,
    /// Best ask price
    pub ask: Decimal,
    /// Size at the best ask
    pub ask_size: u64,
    /// Local capture instant, used only for latency statistics
    pub received_at: Instant,
}

impl Record {
    /// Build a record stamped with the current instant
    pub fn new(
        feed_id: FeedId,
        time: TimePoint,
        symbol: Symbol,
        (bid, bid_size): (Decimal, u64),
        (ask, ask_size): (Decimal, u64),
    ) -> Self {
        Self {
            feed_id,
            time,
            symbol,
            bid,
            bid_size,
            ask,
            ask_size,
            received_at: Instant::now(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.feed_id, self.time, self.symbol, self.bid, self.bid_size, self.ask, self.ask_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_roundtrip() {
        let symbol = Symbol::new("SPY").unwrap();
        assert_eq!(symbol.as_str(), "SPY");
        assert_eq!(symbol.to_string(), "SPY");
        assert_eq!(format!("{symbol:?}"), "Symbol(\"SPY\")");
    }

    #[test]
    fn test_symbol_capacity() {
        assert!(Symbol::new("ABCDEFGH").is_ok());
        assert!(matches!(
            Symbol::new("ABCDEFGHI"),
            Err(SymbolError::TooLong(_))
        ));
    }

    #[test]
    fn test_symbol_rejects_bad_input() {
        assert_eq!(Symbol::new(""), Err(SymbolError::Empty));
        assert!(matches!(
            Symbol::new("SP Y"),
            Err(SymbolError::InvalidCharacter(_))
        ));
        assert!(matches!(
            Symbol::new("É"),
            Err(SymbolError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_symbol_ordering_is_lexicographic() {
        let mut symbols: Vec<Symbol> = ["SPY", "AAPL", "SP", "QQQ"]
            .into_iter()
            .map(|s| Symbol::new(s).unwrap())
            .collect();
        symbols.sort();
        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["AAPL", "QQQ", "SP", "SPY"]);
    }

    #[test]
    fn test_symbol_equality_ignores_storage() {
        let a = Symbol::try_from("EEM").unwrap();
        let b = Symbol::new("EEM").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Symbol::new("EEMV").unwrap());
    }

    #[test]
    fn test_record_display() {
        let record = Record::new(
            2,
            TimePoint::parse("09:00:00.007").unwrap(),
            Symbol::new("SPY").unwrap(),
            (dec!(205.24), 1138),
            (dec!(205.25), 406),
        );
        assert_eq!(record.to_string(), "2,09:00:00.007,SPY,205.24,1138,205.25,406");
    }
}
