//! Configuration validation and resolution.
//!
//! Every key is optional. Present keys are checked before any command runs,
//! so a bad value fails fast instead of halfway through a download.

use crate::domain::error::FundScoreError;
use crate::domain::etf_map::FundEtfMap;
use crate::domain::fetch::FetchPlan;
use crate::domain::ohlcv::Interval;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_BASE_PATH: &str = "data";
pub const DEFAULT_FUND_TABLE: &str = "manulife_funds.csv";
pub const DEFAULT_ETF_DIR: &str = "etfs";
pub const DEFAULT_FUND_URL: &str =
    "https://raw.githubusercontent.com/thomasytt/Manulife/main/csv%20data%20for%20DS.csv";
pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_PERIOD: &str = "max";
pub const DEFAULT_VOLATILITY_SYMBOL: &str = "^VIX";
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;

const PERIODS: [&str; 11] = [
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Where the store lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSettings {
    pub base_path: String,
    pub fund_table: String,
    pub etf_dir: String,
}

/// Remote endpoints and request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub fund_url: String,
    pub chart_url: String,
    pub timeout_secs: u64,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    validate_data(config)?;
    validate_period(config)?;
    validate_interval(config)?;
    validate_timeout(config)?;
    validate_urls(config)?;
    validate_mapping(config)?;
    Ok(())
}

fn string_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> String {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> FundScoreError {
    FundScoreError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    for key in ["fund_table", "etf_dir"] {
        if let Some(value) = config.get_string("data", key) {
            if value.contains("..") {
                return Err(invalid("data", key, "must not leave base_path"));
            }
        }
    }
    if let Some(name) = config.get_string("data", "fund_table") {
        if !name.trim().is_empty() && !name.trim().ends_with(".csv") {
            return Err(invalid("data", "fund_table", "must be a .csv file"));
        }
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    let period = string_or(config, "fetch", "period", DEFAULT_PERIOD);
    if !PERIODS.contains(&period.as_str()) {
        return Err(invalid(
            "fetch",
            "period",
            format!("unknown period '{period}', expected one of {}", PERIODS.join(", ")),
        ));
    }
    Ok(())
}

fn interval(config: &dyn ConfigPort) -> Result<Interval, FundScoreError> {
    let raw = string_or(config, "fetch", "interval", Interval::Daily.as_query());
    Interval::from_query(&raw)
        .ok_or_else(|| invalid("fetch", "interval", format!("'{raw}' is not 1d or 1wk")))
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    interval(config).map(|_| ())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    let value = config.get_int("fetch", "timeout_secs", DEFAULT_TIMEOUT_SECS);
    if value <= 0 {
        return Err(invalid("fetch", "timeout_secs", "timeout_secs must be positive"));
    }
    Ok(())
}

fn validate_urls(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    for key in ["fund_url", "yahoo_base_url"] {
        if let Some(url) = config.get_string("fetch", key) {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("fetch", key, "expected an http(s) URL"));
            }
        }
    }
    Ok(())
}

fn validate_mapping(config: &dyn ConfigPort) -> Result<(), FundScoreError> {
    for (code, ticker) in config.get_section("mapping") {
        if ticker.trim().is_empty() {
            return Err(invalid("mapping", &code, "ticker must not be empty"));
        }
        if ticker.trim().contains(char::is_whitespace) {
            return Err(invalid("mapping", &code, "ticker must be a single symbol"));
        }
    }
    Ok(())
}

/// Default fund-to-ETF map with `[mapping]` entries layered on top.
pub fn etf_map_from_config(config: &dyn ConfigPort) -> Result<FundEtfMap, FundScoreError> {
    validate_mapping(config)?;
    let mut map = FundEtfMap::default();
    for (code, ticker) in config.get_section("mapping") {
        map.insert(code.trim(), ticker.trim());
    }
    Ok(map)
}

pub fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, FundScoreError> {
    validate_data(config)?;
    Ok(DataSettings {
        base_path: string_or(config, "data", "base_path", DEFAULT_BASE_PATH),
        fund_table: string_or(config, "data", "fund_table", DEFAULT_FUND_TABLE),
        etf_dir: string_or(config, "data", "etf_dir", DEFAULT_ETF_DIR),
    })
}

pub fn fetch_settings(config: &dyn ConfigPort) -> Result<FetchSettings, FundScoreError> {
    validate_timeout(config)?;
    validate_urls(config)?;
    Ok(FetchSettings {
        fund_url: string_or(config, "fetch", "fund_url", DEFAULT_FUND_URL),
        chart_url: string_or(config, "fetch", "yahoo_base_url", DEFAULT_CHART_URL),
        timeout_secs: config.get_int("fetch", "timeout_secs", DEFAULT_TIMEOUT_SECS) as u64,
    })
}

/// Download plan covering every ticker of the extended map plus any
/// `[mapping]` overrides.
pub fn fetch_plan_from_config(config: &dyn ConfigPort) -> Result<FetchPlan, FundScoreError> {
    validate_period(config)?;
    let mut map = FundEtfMap::extended();
    for (code, ticker) in config.get_section("mapping") {
        map.insert(code.trim(), ticker.trim());
    }
    Ok(FetchPlan {
        tickers: map.tickers().into_iter().map(str::to_string).collect(),
        volatility_symbol: string_or(
            config,
            "fetch",
            "volatility_symbol",
            DEFAULT_VOLATILITY_SYMBOL,
        ),
        period: string_or(config, "fetch", "period", DEFAULT_PERIOD),
        interval: interval(config)?,
    })
}
