//! Batch download of ETF, volatility index and fund history into the store.
//!
//! Tickers are processed one after another. A ticker that yields no data is
//! logged and skipped; it never aborts the batch. Store failures do.

use crate::domain::error::FundScoreError;
use crate::domain::ohlcv::Interval;
use crate::domain::resample::resample_weekly;
use crate::ports::data_port::DataStorePort;
use crate::ports::market_data_port::{FundSourcePort, MarketDataPort};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub tickers: Vec<String>,
    pub volatility_symbol: String,
    pub period: String,
    pub interval: Interval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Storage keys written, with the number of bars downloaded.
    pub saved: Vec<(String, usize)>,
    /// Symbols that returned no data.
    pub empty: Vec<String>,
    /// Fund codes resolved from the downloaded fund table.
    pub funds: Vec<String>,
    pub fund_error: Option<String>,
}

/// Storage key for a provider symbol: index prefixes dropped, upper case.
pub fn storage_key(symbol: &str) -> String {
    symbol.trim().trim_start_matches('^').to_uppercase()
}

pub fn run_fetch(
    provider: &dyn MarketDataPort,
    fund_source: Option<&dyn FundSourcePort>,
    store: &dyn DataStorePort,
    plan: &FetchPlan,
) -> Result<FetchReport, FundScoreError> {
    let mut report = FetchReport::default();

    let mut symbols: Vec<(&str, Interval)> = plan
        .tickers
        .iter()
        .map(|t| (t.as_str(), plan.interval))
        .collect();
    // the scorer reads the volatility index from its daily table
    symbols.push((plan.volatility_symbol.as_str(), Interval::Daily));

    for (symbol, interval) in symbols {
        info!(symbol, %interval, "fetching");
        let bars = provider.fetch(symbol, &plan.period, interval.as_query());
        if bars.is_empty() {
            warn!(symbol, "no data returned, check the ticker");
            report.empty.push(symbol.to_string());
            continue;
        }

        let key = storage_key(symbol);
        if interval == Interval::Daily {
            store.save_ohlcv(&key, Interval::Daily, &bars)?;
        }
        // provider weeks may be labelled on any weekday
        let weekly = resample_weekly(&bars);
        store.save_ohlcv(&key, Interval::Weekly, &weekly)?;
        info!(symbol, key = %key, bars = bars.len(), weeks = weekly.len(), "saved");
        report.saved.push((key, bars.len()));
    }

    if let Some(source) = fund_source {
        match source.fetch_fund_table() {
            Ok(table) => {
                let table = table.with_derived_weekly();
                store.save_fund_table(&table)?;
                report.funds = table.codes().into_iter().map(str::to_string).collect();
                info!(funds = report.funds.len(), "fund table saved");
            }
            Err(e) => {
                warn!(error = %e, "fund table download failed");
                report.fund_error = Some(e.to_string());
            }
        }
    }

    Ok(report)
}
