//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod http_fund_source;
pub mod yahoo_adapter;
