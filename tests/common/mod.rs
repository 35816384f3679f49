#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use fundscore::domain::error::FundScoreError;
use fundscore::domain::etf_map::FundEtfMap;
use fundscore::domain::fund::{FundRecord, FundTable};
pub use fundscore::domain::ohlcv::{Interval, OhlcvBar};
pub use fundscore::domain::price_series::PriceSeries;
use fundscore::domain::scorer::Scorer;
use fundscore::ports::data_port::DataStorePort;
use fundscore::ports::market_data_port::{FundSourcePort, MarketDataPort};
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory store. Tables saved through the port are visible to later loads.
pub struct MockStore {
    pub funds: RefCell<Option<FundTable>>,
    pub ohlcv: RefCell<HashMap<(String, Interval), Vec<OhlcvBar>>>,
    pub errors: HashMap<String, String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            funds: RefCell::new(None),
            ohlcv: RefCell::new(HashMap::new()),
            errors: HashMap::new(),
        }
    }

    pub fn with_funds(self, table: FundTable) -> Self {
        *self.funds.borrow_mut() = Some(table);
        self
    }

    pub fn with_bars(self, key: &str, interval: Interval, bars: Vec<OhlcvBar>) -> Self {
        self.ohlcv
            .borrow_mut()
            .insert((key.to_string(), interval), bars);
        self
    }

    pub fn with_error(mut self, key: &str, reason: &str) -> Self {
        self.errors.insert(key.to_string(), reason.to_string());
        self
    }
}

impl DataStorePort for MockStore {
    fn load_fund_table(&self) -> Result<FundTable, FundScoreError> {
        self.funds
            .borrow()
            .clone()
            .ok_or_else(|| FundScoreError::NoData {
                key: "funds".into(),
            })
    }

    fn save_fund_table(&self, table: &FundTable) -> Result<(), FundScoreError> {
        *self.funds.borrow_mut() = Some(table.clone());
        Ok(())
    }

    fn load_ohlcv(&self, key: &str, interval: Interval) -> Result<Vec<OhlcvBar>, FundScoreError> {
        if let Some(reason) = self.errors.get(key) {
            return Err(FundScoreError::Parse {
                file: key.to_string(),
                reason: reason.clone(),
            });
        }
        self.ohlcv
            .borrow()
            .get(&(key.to_string(), interval))
            .cloned()
            .ok_or_else(|| FundScoreError::NoData { key: key.into() })
    }

    fn save_ohlcv(
        &self,
        key: &str,
        interval: Interval,
        bars: &[OhlcvBar],
    ) -> Result<(), FundScoreError> {
        self.ohlcv
            .borrow_mut()
            .insert((key.to_string(), interval), bars.to_vec());
        Ok(())
    }
}

/// Provider serving canned bars; records each requested ticker.
pub struct MockProvider {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub calls: RefCell<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }
}

impl MarketDataPort for MockProvider {
    fn fetch(&self, ticker: &str, _period: &str, _interval: &str) -> Vec<OhlcvBar> {
        self.calls.borrow_mut().push(ticker.to_string());
        self.data.get(ticker).cloned().unwrap_or_default()
    }
}

pub struct MockFundSource {
    pub table: Option<FundTable>,
}

impl FundSourcePort for MockFundSource {
    fn fetch_fund_table(&self) -> Result<FundTable, FundScoreError> {
        self.table.clone().ok_or_else(|| FundScoreError::Http {
            reason: "connection refused".into(),
        })
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Weekly series on consecutive Fridays starting 2022-01-07.
pub fn weekly_series(values: &[f64]) -> PriceSeries {
    spaced_series(date("2022-01-07"), 7, values)
}

/// Daily series on consecutive calendar days starting 2022-01-03.
pub fn daily_series(values: &[f64]) -> PriceSeries {
    spaced_series(date("2022-01-03"), 1, values)
}

pub fn spaced_series(start: NaiveDate, step_days: i64, values: &[f64]) -> PriceSeries {
    PriceSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + Duration::days(i as i64 * step_days), v)),
    )
}

pub fn make_bar(date: NaiveDate, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
    }
}

/// Weekly ETF bars aligned with [`weekly_series`].
pub fn weekly_bars(closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&c, &v))| make_bar(date("2022-01-07") + Duration::days(7 * i as i64), c, v))
        .collect()
}

pub fn linear(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

pub fn scorer_for(records: Vec<FundRecord>) -> Scorer {
    Scorer::new(
        FundTable::from_records(records),
        daily_series(&[18.0, 19.5, 21.0]),
        HashMap::new(),
        FundEtfMap::default(),
    )
}
