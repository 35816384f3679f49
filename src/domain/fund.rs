//! Fund records resolved from the wide-format fund table.
//!
//! The persisted table carries one `Date` index and per-fund columns named
//! `{code}_Close` (weekly, the lower-frequency series) and
//! `{code}_Daily_Close`. Columns are resolved into typed [`FundRecord`]s once,
//! when the table is built.

use crate::domain::error::FundScoreError;
use crate::domain::price_series::PriceSeries;
use crate::domain::resample::resample_series_weekly;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const WEEKLY_SUFFIX: &str = "_Close";
pub const DAILY_SUFFIX: &str = "_Daily_Close";

pub fn weekly_column(code: &str) -> String {
    format!("{code}{WEEKLY_SUFFIX}")
}

pub fn daily_column(code: &str) -> String {
    format!("{code}{DAILY_SUFFIX}")
}

/// Which series of a fund a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Weekly,
    Daily,
}

/// Splits a column name into fund code and series kind.
pub fn parse_column(name: &str) -> Option<(&str, ColumnKind)> {
    if let Some(code) = name.strip_suffix(DAILY_SUFFIX) {
        return (!code.is_empty()).then_some((code, ColumnKind::Daily));
    }
    if let Some(code) = name.strip_suffix(WEEKLY_SUFFIX) {
        return (!code.is_empty()).then_some((code, ColumnKind::Weekly));
    }
    None
}

#[derive(Debug, Clone)]
pub struct FundRecord {
    pub code: String,
    pub weekly: PriceSeries,
    pub daily: PriceSeries,
}

impl FundRecord {
    pub fn new(code: impl Into<String>, weekly: PriceSeries, daily: PriceSeries) -> Self {
        Self {
            code: code.into(),
            weekly,
            daily,
        }
    }

    /// Latest date present in either series.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        let w = self.weekly.last().map(|p| p.date);
        let d = self.daily.last().map(|p| p.date);
        w.max(d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FundTable {
    columns: Vec<(String, PriceSeries)>,
    records: BTreeMap<String, FundRecord>,
    incomplete: BTreeMap<String, String>,
}

impl FundTable {
    /// Builds the table from named columns, resolving fund records.
    ///
    /// A fund with only one of its two columns is kept as incomplete; looking
    /// it up reports the column that is missing.
    pub fn from_columns(columns: Vec<(String, PriceSeries)>) -> Self {
        let mut weekly: BTreeMap<String, PriceSeries> = BTreeMap::new();
        let mut daily: BTreeMap<String, PriceSeries> = BTreeMap::new();

        for (name, series) in &columns {
            match parse_column(name) {
                Some((code, ColumnKind::Weekly)) => {
                    weekly.insert(code.to_string(), series.clone());
                }
                Some((code, ColumnKind::Daily)) => {
                    daily.insert(code.to_string(), series.clone());
                }
                None => {}
            }
        }

        let mut records = BTreeMap::new();
        let mut incomplete = BTreeMap::new();

        for (code, w) in weekly {
            match daily.remove(&code) {
                Some(d) => {
                    records.insert(code.clone(), FundRecord::new(code, w, d));
                }
                None => {
                    incomplete.insert(code.clone(), daily_column(&code));
                }
            }
        }
        for code in daily.into_keys() {
            incomplete.insert(code.clone(), weekly_column(&code));
        }

        Self {
            columns,
            records,
            incomplete,
        }
    }

    pub fn from_records(records: Vec<FundRecord>) -> Self {
        let columns = records
            .into_iter()
            .flat_map(|r| {
                [
                    (weekly_column(&r.code), r.weekly),
                    (daily_column(&r.code), r.daily),
                ]
            })
            .collect();
        Self::from_columns(columns)
    }

    /// Adds a `{code}_Close` column resampled from `{code}_Daily_Close` for
    /// every fund that only has the daily column.
    pub fn with_derived_weekly(self) -> Self {
        let mut columns = self.columns;
        let derived: Vec<(String, PriceSeries)> = columns
            .iter()
            .filter_map(|(name, series)| match parse_column(name) {
                Some((code, ColumnKind::Daily))
                    if self.incomplete.get(code) == Some(&weekly_column(code)) =>
                {
                    Some((weekly_column(code), resample_series_weekly(series)))
                }
                _ => None,
            })
            .collect();
        columns.extend(derived);
        Self::from_columns(columns)
    }

    pub fn fund(&self, code: &str) -> Result<&FundRecord, FundScoreError> {
        if let Some(record) = self.records.get(code) {
            return Ok(record);
        }
        let column = self
            .incomplete
            .get(code)
            .cloned()
            .unwrap_or_else(|| weekly_column(code));
        Err(FundScoreError::missing_column(code, column))
    }

    /// Codes with both columns present, sorted.
    pub fn codes(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn columns(&self) -> &[(String, PriceSeries)] {
        &self.columns
    }

    /// Union of all dates across columns, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .columns
            .iter()
            .flat_map(|(_, s)| s.points().iter().map(|p| p.date))
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
