//! Session-local timestamps with millisecond resolution

use chrono::NaiveTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of the `HH:MM:SS.mmm` token
const TOKEN_LEN: usize = 12;

/// Errors produced while parsing a time token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// Token is not `HH:MM:SS.mmm`
    #[error("malformed time token: {0:?}")]
    Malformed(String),
    /// A field is outside its range
    #[error("time field out of range in {0:?}")]
    OutOfRange(String),
}

/// A time of day in the trading session, `HH:MM:SS.mmm`
///
/// The default value is invalid and orders below every valid time point, so
/// it can stand in for "no time yet" but never for a real event time.
/// Field order matters: the derived ordering compares validity first and
/// then the clock fields lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint {
    valid: bool,
    hour: u8,
    minute: u8,
    second: u8,
    millisecond: u16,
}

impl TimePoint {
    /// Build a time point from its fields
    pub fn new(hour: u8, minute: u8, second: u8, millisecond: u16) -> Result<Self, TimeParseError> {
        if hour > 23 || minute > 59 || second > 59 || millisecond > 999 {
            return Err(TimeParseError::OutOfRange(format!(
                "{hour:02}:{minute:02}:{second:02}.{millisecond:03}"
            )));
        }
        Ok(Self {
            valid: true,
            hour,
            minute,
            second,
            millisecond,
        })
    }

    /// Parse a fixed-width `HH:MM:SS.mmm` token
    pub fn parse(token: &str) -> Result<Self, TimeParseError> {
        let bytes = token.as_bytes();
        let malformed = || TimeParseError::Malformed(token.to_string());

        if bytes.len() != TOKEN_LEN || bytes[2] != b':' || bytes[5] != b':' || bytes[8] != b'.' {
            return Err(malformed());
        }

        let hour = digits(&bytes[0..2]).ok_or_else(malformed)?;
        let minute = digits(&bytes[3..5]).ok_or_else(malformed)?;
        let second = digits(&bytes[6..8]).ok_or_else(malformed)?;
        let millisecond = digits(&bytes[9..12]).ok_or_else(malformed)?;

        Self::new(hour as u8, minute as u8, second as u8, millisecond)
    }

    /// Parse a token, yielding an invalid time point instead of an error
    pub fn parse_or_invalid(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn millisecond(&self) -> u16 {
        self.millisecond
    }

    /// Milliseconds since midnight, `None` for an invalid time point
    pub fn millis_since_midnight(&self) -> Option<u32> {
        self.valid.then(|| {
            ((self.hour as u32 * 60 + self.minute as u32) * 60 + self.second as u32) * 1000
                + self.millisecond as u32
        })
    }

    /// Convert to a chrono time of day
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        if !self.valid {
            return None;
        }
        NaiveTime::from_hms_milli_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
            self.millisecond as u32,
        )
    }
}

fn digits(bytes: &[u8]) -> Option<u16> {
    bytes.iter().try_fold(0u16, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u16)
    })
}

impl FromStr for TimePoint {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hour, self.minute, self.second, self.millisecond
        )
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
