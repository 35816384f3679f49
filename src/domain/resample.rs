//! Daily to weekly resampling.
//!
//! Weeks run Saturday through Friday and are labelled with their Friday.
//! Weeks with no input rows produce no output row.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PriceSeries;
use chrono::{Datelike, Duration, NaiveDate};

/// Friday that closes the week containing `date`.
pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let offset = (4 + 7 - date.weekday().num_days_from_monday() as i64) % 7;
    date + Duration::days(offset)
}

/// Aggregates bars into weekly bars: first open, max high, min low, last
/// close, summed volume.
pub fn resample_weekly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut weekly: Vec<OhlcvBar> = Vec::new();

    for bar in bars {
        let label = week_ending_friday(bar.date);
        match weekly.last_mut() {
            Some(week) if week.date == label => {
                week.high = week.high.max(bar.high);
                week.low = week.low.min(bar.low);
                week.close = bar.close;
                week.volume += bar.volume;
            }
            _ => weekly.push(OhlcvBar {
                date: label,
                ..bar.clone()
            }),
        }
    }

    weekly
}

/// Last value of each week.
pub fn resample_series_weekly(series: &PriceSeries) -> PriceSeries {
    let mut weekly: Vec<(NaiveDate, f64)> = Vec::new();

    for point in series.points() {
        let label = week_ending_friday(point.date);
        match weekly.last_mut() {
            Some(last) if last.0 == label => last.1 = point.value,
            _ => weekly.push((label, point.value)),
        }
    }

    PriceSeries::from_pairs(weekly)
}
