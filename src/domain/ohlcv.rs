//! OHLCV bar representation.

use chrono::NaiveDate;
use std::fmt;

/// Sampling interval of a stored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
    Weekly,
}

impl Interval {
    /// Interval string understood by the chart endpoint.
    pub fn as_query(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }

    pub fn from_query(s: &str) -> Option<Self> {
        match s.trim() {
            "1d" => Some(Interval::Daily),
            "1wk" => Some(Interval::Weekly),
            _ => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Weekly => write!(f, "weekly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Bars dated on or before `as_of`. Input must be sorted by date.
pub fn bars_as_of(bars: &[OhlcvBar], as_of: NaiveDate) -> &[OhlcvBar] {
    let end = bars.partition_point(|b| b.date <= as_of);
    &bars[..end]
}
