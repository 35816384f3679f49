//! Data store port trait.
//!
//! Tables are addressed by logical key: the fund table is a single wide table,
//! ETF and index tables are keyed by ticker and interval.

use crate::domain::error::FundScoreError;
use crate::domain::fund::FundTable;
use crate::domain::ohlcv::{Interval, OhlcvBar};
use crate::domain::price_series::PriceSeries;

pub trait DataStorePort {
    fn load_fund_table(&self) -> Result<FundTable, FundScoreError>;

    fn save_fund_table(&self, table: &FundTable) -> Result<(), FundScoreError>;

    /// Bars sorted by date. A key with no stored table is `NoData`.
    fn load_ohlcv(&self, key: &str, interval: Interval) -> Result<Vec<OhlcvBar>, FundScoreError>;

    fn save_ohlcv(
        &self,
        key: &str,
        interval: Interval,
        bars: &[OhlcvBar],
    ) -> Result<(), FundScoreError>;

    /// Close column of a stored OHLCV table.
    fn load_close_series(&self, key: &str, interval: Interval) -> Result<PriceSeries, FundScoreError> {
        let bars = self.load_ohlcv(key, interval)?;
        Ok(PriceSeries::from_closes(&bars))
    }
}
