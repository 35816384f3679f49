//! Yahoo Finance chart endpoint adapter.

use crate::domain::error::FundScoreError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("fundscore/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn exchange_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Converts a chart response body into bars sorted by date.
///
/// Rows without a close are dropped. Missing open/high/low fall back to the
/// close and a missing volume counts as 0. Timestamps are shifted by the
/// exchange offset so each bar carries its local trading date.
pub fn parse_chart(body: &str) -> Result<Vec<OhlcvBar>, FundScoreError> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| FundScoreError::Parse {
        file: "chart response".into(),
        reason: e.to_string(),
    })?;

    if let Some(err) = response.chart.error {
        return Err(FundScoreError::Http {
            reason: format!(
                "{}: {}",
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            ),
        });
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten().filter(|x| x.is_finite());

    let mut bars: Vec<OhlcvBar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let Some(date) = exchange_date(ts, result.meta.gmtoffset) else {
            continue;
        };
        let bar = OhlcvBar {
            date,
            open: at(&quote.open, i).unwrap_or(close),
            high: at(&quote.high, i).unwrap_or(close),
            low: at(&quote.low, i).unwrap_or(close),
            close,
            volume: at(&quote.volume, i).map(|v| v as i64).unwrap_or(0),
        };
        // Intraday snapshots can repeat the last session's date.
        match bars.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => bars.push(bar),
        }
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

pub struct YahooAdapter {
    client: Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FundScoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FundScoreError::Http {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, ticker: &str, period: &str, interval: &str) -> Result<Vec<OhlcvBar>, FundScoreError> {
        let url = format!("{}/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval), ("events", "history")])
            .send()
            .map_err(|e| FundScoreError::Http { reason: e.to_string() })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FundScoreError::Http { reason: e.to_string() })?;
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(FundScoreError::Http {
                reason: format!("request failed: {status}"),
            });
        }
        parse_chart(&body)
    }
}

impl MarketDataPort for YahooAdapter {
    fn fetch(&self, ticker: &str, period: &str, interval: &str) -> Vec<OhlcvBar> {
        match self.request(ticker, period, interval) {
            Ok(bars) => {
                debug!(ticker, bars = bars.len(), "chart downloaded");
                bars
            }
            Err(e) => {
                warn!(ticker, error = %e, "chart download failed");
                Vec::new()
            }
        }
    }
}
