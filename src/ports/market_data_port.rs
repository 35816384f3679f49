//! Market data provider port traits.

use crate::domain::error::FundScoreError;
use crate::domain::fund::FundTable;
use crate::domain::ohlcv::OhlcvBar;

/// Historical OHLCV source.
///
/// Implementations never fail on an unknown ticker or a transport error: they
/// log a warning and return an empty vector so a batch can continue.
pub trait MarketDataPort {
    fn fetch(&self, ticker: &str, period: &str, interval: &str) -> Vec<OhlcvBar>;
}

/// Source of the wide-format fund price table.
pub trait FundSourcePort {
    fn fetch_fund_table(&self) -> Result<FundTable, FundScoreError>;
}
