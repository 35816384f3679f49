//! Core domain types and scoring logic.

pub mod config_validation;
pub mod error;
pub mod etf_map;
pub mod fetch;
pub mod fund;
pub mod indicator;
pub mod ohlcv;
pub mod price_series;
pub mod resample;
pub mod scorer;
pub mod signals;
