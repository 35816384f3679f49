//! Composite buy score per fund.
//!
//! The scorer owns immutable copies of the fund table, the volatility index
//! series and each mapped ETF's weekly bars. Every signal takes an explicit
//! `as_of` date and only sees data dated on or before it, so a score is a pure
//! function of the loaded tables and the date.

use crate::domain::error::FundScoreError;
use crate::domain::etf_map::FundEtfMap;
use crate::domain::fund::{FundRecord, FundTable};
use crate::domain::ohlcv::{Interval, OhlcvBar, bars_as_of};
use crate::domain::price_series::PriceSeries;
use crate::domain::signals;
use crate::ports::data_port::DataStorePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const EMA_SLOPE_POINTS: u32 = 1;
pub const MACD_EXPANSION_POINTS: u32 = 1;
pub const CCI_BREAKTHROUGH_POINTS: u32 = 2;
pub const VOLUME_DIVERGENCE_POINTS: u32 = 1;
pub const VOLATILITY_FILTER_POINTS: u32 = 1;
pub const RSI_RESONANCE_POINTS: u32 = 1;
pub const REGION_ROTATION_MAX: u32 = 2;
pub const CROSS_MARKET_MAX: u32 = 1;
pub const SECTOR_FLOW_MAX: u32 = 1;
pub const MAX_SCORE: u32 = 11;

/// Key under which the volatility index is stored.
pub const DEFAULT_VOLATILITY_KEY: &str = "VIX";

/// Score contribution of a CCI signal: flat, regardless of direction.
pub fn cci_points(signal: i8) -> u32 {
    if signal != 0 { CCI_BREAKTHROUGH_POINTS } else { 0 }
}

fn points_if(signal: bool, points: u32) -> u32 {
    if signal { points } else { 0 }
}

/// Every signal value behind one score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub code: String,
    pub as_of: NaiveDate,
    pub etf: Option<String>,
    pub ema20_slope: bool,
    pub macd_expansion: bool,
    pub cci_breakthrough: i8,
    pub volume_divergence: bool,
    pub volatility_filter: bool,
    pub rsi_resonance: bool,
    pub region_rotation: u32,
    pub cross_market_correlation: u32,
    pub sector_flow: u32,
    /// Latest volatility index close on or before `as_of`.
    pub volatility_index: Option<f64>,
}

impl ScoreCard {
    /// (label, earned, maximum) per component.
    pub fn contributions(&self) -> Vec<(&'static str, u32, u32)> {
        vec![
            (
                "ema20_slope",
                points_if(self.ema20_slope, EMA_SLOPE_POINTS),
                EMA_SLOPE_POINTS,
            ),
            (
                "macd_expansion",
                points_if(self.macd_expansion, MACD_EXPANSION_POINTS),
                MACD_EXPANSION_POINTS,
            ),
            (
                "cci_breakthrough",
                cci_points(self.cci_breakthrough),
                CCI_BREAKTHROUGH_POINTS,
            ),
            (
                "volume_divergence",
                points_if(self.volume_divergence, VOLUME_DIVERGENCE_POINTS),
                VOLUME_DIVERGENCE_POINTS,
            ),
            (
                "volatility_filter",
                points_if(self.volatility_filter, VOLATILITY_FILTER_POINTS),
                VOLATILITY_FILTER_POINTS,
            ),
            (
                "rsi_resonance",
                points_if(self.rsi_resonance, RSI_RESONANCE_POINTS),
                RSI_RESONANCE_POINTS,
            ),
            ("region_rotation", self.region_rotation, REGION_ROTATION_MAX),
            (
                "cross_market_correlation",
                self.cross_market_correlation,
                CROSS_MARKET_MAX,
            ),
            ("sector_flow", self.sector_flow, SECTOR_FLOW_MAX),
        ]
    }

    pub fn total(&self) -> u32 {
        let sum: u32 = self.contributions().iter().map(|(_, earned, _)| earned).sum();
        sum.min(MAX_SCORE)
    }
}

pub struct Scorer {
    funds: FundTable,
    volatility_index: PriceSeries,
    etfs: HashMap<String, Vec<OhlcvBar>>,
    etf_map: FundEtfMap,
}

impl Scorer {
    pub fn new(
        funds: FundTable,
        volatility_index: PriceSeries,
        etfs: HashMap<String, Vec<OhlcvBar>>,
        etf_map: FundEtfMap,
    ) -> Self {
        Self {
            funds,
            volatility_index,
            etfs,
            etf_map,
        }
    }

    /// Loads every table the scorer needs from the store.
    ///
    /// The fund table and the volatility index are required. A mapped ETF with
    /// no stored table is kept as empty; malformed tables are errors.
    pub fn load(
        store: &dyn DataStorePort,
        etf_map: FundEtfMap,
        volatility_key: &str,
    ) -> Result<Self, FundScoreError> {
        let funds = store.load_fund_table()?;
        let volatility_index = store.load_close_series(volatility_key, Interval::Daily)?;

        let mut etfs = HashMap::new();
        for ticker in etf_map.tickers() {
            let bars = match store.load_ohlcv(ticker, Interval::Weekly) {
                Ok(bars) => bars,
                Err(FundScoreError::NoData { key }) => {
                    warn!(ticker = %key, "no stored ETF table, divergence disabled");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            etfs.insert(ticker.to_string(), bars);
        }

        debug!(
            funds = funds.codes().len(),
            etfs = etfs.len(),
            vix_points = volatility_index.len(),
            "scorer loaded"
        );

        Ok(Self::new(funds, volatility_index, etfs, etf_map))
    }

    pub fn fund_codes(&self) -> Vec<&str> {
        self.funds.codes()
    }

    pub fn etf_map(&self) -> &FundEtfMap {
        &self.etf_map
    }

    pub fn volatility_index(&self) -> &PriceSeries {
        &self.volatility_index
    }

    fn fund(&self, code: &str) -> Result<&FundRecord, FundScoreError> {
        self.funds.fund(code)
    }

    /// Latest date in either of the fund's series, `None` if both are empty.
    pub fn latest_date(&self, code: &str) -> Result<Option<NaiveDate>, FundScoreError> {
        Ok(self.fund(code)?.latest_date())
    }

    pub fn ema20_slope(&self, code: &str, as_of: NaiveDate) -> Result<bool, FundScoreError> {
        let fund = self.fund(code)?;
        Ok(signals::ema20_slope(fund.weekly.as_of(as_of)))
    }

    pub fn macd_expansion(&self, code: &str, as_of: NaiveDate) -> Result<bool, FundScoreError> {
        let fund = self.fund(code)?;
        Ok(signals::macd_expansion(fund.weekly.as_of(as_of)))
    }

    pub fn cci_breakthrough(&self, code: &str, as_of: NaiveDate) -> Result<i8, FundScoreError> {
        let fund = self.fund(code)?;
        Ok(signals::cci_breakthrough(
            fund.daily.as_of(as_of),
            signals::CCI_THRESHOLD,
        ))
    }

    pub fn volume_divergence(&self, code: &str, as_of: NaiveDate) -> Result<bool, FundScoreError> {
        let fund = self.fund(code)?;
        let Some(ticker) = self.etf_map.resolve(code) else {
            return Ok(false);
        };
        let Some(etf) = self.etfs.get(ticker) else {
            return Ok(false);
        };
        let Some(fund_close) = fund.weekly.as_of(as_of).last().map(|p| p.value) else {
            return Ok(false);
        };
        Ok(signals::volume_divergence(fund_close, bars_as_of(etf, as_of)))
    }

    pub fn volatility_filter(&self, code: &str, as_of: NaiveDate) -> Result<bool, FundScoreError> {
        let fund = self.fund(code)?;
        Ok(signals::volatility_filter(fund.weekly.as_of(as_of)))
    }

    pub fn rsi_resonance(&self, code: &str, as_of: NaiveDate) -> Result<bool, FundScoreError> {
        let fund = self.fund(code)?;
        Ok(signals::rsi_resonance(
            fund.weekly.as_of(as_of),
            fund.daily.as_of(as_of),
        ))
    }

    /// Not yet implemented; always 0 of a possible 2.
    pub fn region_rotation(&self, _code: &str, _as_of: NaiveDate) -> u32 {
        0
    }

    /// Not yet implemented; always 0 of a possible 1.
    pub fn cross_market_correlation(&self, _code: &str, _as_of: NaiveDate) -> u32 {
        0
    }

    /// Not yet implemented; always 0 of a possible 1.
    pub fn sector_flow(&self, _code: &str, _as_of: NaiveDate) -> u32 {
        0
    }

    pub fn score_card(&self, code: &str, as_of: NaiveDate) -> Result<ScoreCard, FundScoreError> {
        let card = ScoreCard {
            code: code.to_string(),
            as_of,
            etf: self.etf_map.resolve(code).map(str::to_string),
            ema20_slope: self.ema20_slope(code, as_of)?,
            macd_expansion: self.macd_expansion(code, as_of)?,
            cci_breakthrough: self.cci_breakthrough(code, as_of)?,
            volume_divergence: self.volume_divergence(code, as_of)?,
            volatility_filter: self.volatility_filter(code, as_of)?,
            rsi_resonance: self.rsi_resonance(code, as_of)?,
            region_rotation: self.region_rotation(code, as_of),
            cross_market_correlation: self.cross_market_correlation(code, as_of),
            sector_flow: self.sector_flow(code, as_of),
            volatility_index: self.volatility_index.as_of(as_of).last().map(|p| p.value),
        };
        debug!(code, %as_of, total = card.total(), "scored fund");
        Ok(card)
    }

    pub fn calculate_score_as_of(&self, code: &str, as_of: NaiveDate) -> Result<u32, FundScoreError> {
        Ok(self.score_card(code, as_of)?.total())
    }

    /// Score as of the fund's latest observation. A fund with no observations
    /// scores 0.
    pub fn calculate_score(&self, code: &str) -> Result<u32, FundScoreError> {
        match self.latest_date(code)? {
            Some(as_of) => self.calculate_score_as_of(code, as_of),
            None => Ok(0),
        }
    }
}
