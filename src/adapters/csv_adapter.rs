//! CSV file data store.
//!
//! Layout under `base_path`:
//! - `{fund_table}`: wide fund table, `Date` then one column per series
//! - `{etf_dir}/{KEY}.csv`: weekly OHLCV
//! - `{etf_dir}/{KEY}_daily.csv`: daily OHLCV

use crate::domain::error::FundScoreError;
use crate::domain::fund::FundTable;
use crate::domain::ohlcv::{Interval, OhlcvBar};
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::DataStorePort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";
const OHLCV_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

pub struct CsvStore {
    base_path: PathBuf,
    fund_table: String,
    etf_dir: String,
}

impl CsvStore {
    pub fn new(base_path: PathBuf, fund_table: &str, etf_dir: &str) -> Self {
        Self {
            base_path,
            fund_table: fund_table.to_string(),
            etf_dir: etf_dir.to_string(),
        }
    }

    pub fn fund_table_path(&self) -> PathBuf {
        self.base_path.join(&self.fund_table)
    }

    pub fn ohlcv_path(&self, key: &str, interval: Interval) -> PathBuf {
        let name = match interval {
            Interval::Weekly => format!("{key}.csv"),
            Interval::Daily => format!("{key}_daily.csv"),
        };
        self.base_path.join(&self.etf_dir).join(name)
    }

    fn read(path: &Path, key: &str) -> Result<String, FundScoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FundScoreError::NoData { key: key.into() })
            }
            Err(e) => Err(FundScoreError::Store {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    fn writer(path: &Path) -> Result<csv::Writer<fs::File>, FundScoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        csv::Writer::from_path(path).map_err(|e| FundScoreError::Store {
            reason: format!("failed to create {}: {}", path.display(), e),
        })
    }
}

fn store_err(path: &Path, e: impl std::fmt::Display) -> FundScoreError {
    FundScoreError::Store {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn parse_err(source: &str, reason: impl Into<String>) -> FundScoreError {
    FundScoreError::Parse {
        file: source.to_string(),
        reason: reason.into(),
    }
}

fn parse_date(value: &str, source: &str) -> Result<NaiveDate, FundScoreError> {
    // Some exports carry a time component after the date.
    let day = value.trim().split([' ', 'T']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, DATE_FORMAT)
        .map_err(|e| parse_err(source, format!("invalid date '{value}': {e}")))
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str, source: &str) -> Result<f64, FundScoreError> {
    record
        .get(idx)
        .ok_or_else(|| parse_err(source, format!("missing {name} column")))?
        .trim()
        .parse()
        .map_err(|e| parse_err(source, format!("invalid {name} value: {e}")))
}

fn parse_volume(record: &csv::StringRecord, source: &str) -> Result<i64, FundScoreError> {
    let raw = record
        .get(5)
        .ok_or_else(|| parse_err(source, "missing volume column"))?
        .trim();
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<i64>() {
        Ok(v) => Ok(v),
        Err(_) => raw
            .parse::<f64>()
            .map(|v| v as i64)
            .map_err(|e| parse_err(source, format!("invalid volume value: {e}"))),
    }
}

/// Parses a wide fund table. Empty cells are gaps in that column.
pub fn parse_fund_table(content: &str, source: &str) -> Result<FundTable, FundScoreError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| parse_err(source, format!("CSV header error: {e}")))?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("date"))
        .ok_or_else(|| parse_err(source, "missing Date column"))?;

    let names: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();
    let mut columns: Vec<Vec<PricePoint>> = vec![Vec::new(); names.len()];

    for result in rdr.records() {
        let record = result.map_err(|e| parse_err(source, format!("CSV parse error: {e}")))?;
        let date_str = record
            .get(date_idx)
            .ok_or_else(|| parse_err(source, "missing date value"))?;
        if date_str.trim().is_empty() {
            continue;
        }
        let date = parse_date(date_str, source)?;

        for (slot, (idx, name)) in names.iter().enumerate() {
            let cell = record.get(*idx).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell
                .parse()
                .map_err(|e| parse_err(source, format!("invalid value in {name}: {e}")))?;
            columns[slot].push(PricePoint { date, value });
        }
    }

    let columns = names
        .into_iter()
        .zip(columns)
        .map(|((_, name), points)| (name, PriceSeries::new(points)))
        .collect();
    Ok(FundTable::from_columns(columns))
}

fn parse_ohlcv(content: &str, source: &str) -> Result<Vec<OhlcvBar>, FundScoreError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| parse_err(source, format!("CSV parse error: {e}")))?;
        let date_str = record
            .get(0)
            .ok_or_else(|| parse_err(source, "missing date column"))?;
        let date = parse_date(date_str, source)?;

        bars.push(OhlcvBar {
            date,
            open: parse_field(&record, 1, "open", source)?,
            high: parse_field(&record, 2, "high", source)?,
            low: parse_field(&record, 3, "low", source)?,
            close: parse_field(&record, 4, "close", source)?,
            volume: parse_volume(&record, source)?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl DataStorePort for CsvStore {
    fn load_fund_table(&self) -> Result<FundTable, FundScoreError> {
        let path = self.fund_table_path();
        let content = Self::read(&path, &self.fund_table)?;
        let table = parse_fund_table(&content, &path.display().to_string())?;
        debug!(path = %path.display(), funds = table.codes().len(), "loaded fund table");
        Ok(table)
    }

    fn save_fund_table(&self, table: &FundTable) -> Result<(), FundScoreError> {
        let path = self.fund_table_path();
        let mut wtr = Self::writer(&path)?;

        let mut header = vec!["Date".to_string()];
        header.extend(table.columns().iter().map(|(name, _)| name.clone()));
        wtr.write_record(&header).map_err(|e| store_err(&path, e))?;

        let lookups: Vec<BTreeMap<NaiveDate, f64>> = table
            .columns()
            .iter()
            .map(|(_, s)| s.points().iter().map(|p| (p.date, p.value)).collect())
            .collect();

        for date in table.dates() {
            let mut row = vec![date.format(DATE_FORMAT).to_string()];
            row.extend(
                lookups
                    .iter()
                    .map(|m| m.get(&date).map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&row).map_err(|e| store_err(&path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn load_ohlcv(&self, key: &str, interval: Interval) -> Result<Vec<OhlcvBar>, FundScoreError> {
        let path = self.ohlcv_path(key, interval);
        let content = Self::read(&path, key)?;
        parse_ohlcv(&content, &path.display().to_string())
    }

    fn save_ohlcv(
        &self,
        key: &str,
        interval: Interval,
        bars: &[OhlcvBar],
    ) -> Result<(), FundScoreError> {
        let path = self.ohlcv_path(key, interval);
        let mut wtr = Self::writer(&path)?;
        wtr.write_record(OHLCV_HEADER).map_err(|e| store_err(&path, e))?;
        for bar in bars {
            wtr.write_record([
                bar.date.format(DATE_FORMAT).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(|e| store_err(&path, e))?;
        }
        wtr.flush()?;
        debug!(path = %path.display(), bars = bars.len(), "saved {interval} table");
        Ok(())
    }
}
