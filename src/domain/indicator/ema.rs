//! Exponential Moving Average indicator.
//!
//! Adjusted exponential weighting with alpha = 2/(span+1):
//! EMA[i] = sum(w_j * C[i-j]) / sum(w_j), w_j = (1-alpha)^j, j = 0..=i.
//! There is no SMA seed; every point carries the full weighted history.
//! Warmup: the first (min_periods - 1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::price_series::PricePoint;

pub fn calculate_ema(points: &[PricePoint], span: usize, min_periods: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Ema { span, min_periods };
    if span == 0 || points.is_empty() {
        return IndicatorSeries::empty(indicator_type);
    }

    let values = ema_values(points.iter().map(|p| p.value), span)
        .into_iter()
        .zip(points)
        .enumerate()
        .map(|(i, (ema, p))| IndicatorPoint {
            date: p.date,
            valid: i + 1 >= min_periods.max(1),
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Raw adjusted EMA over a value stream, no warmup masking.
pub fn ema_values<I>(values: I, span: usize) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;

    values
        .into_iter()
        .map(|x| {
            num = x + decay * num;
            den = 1.0 + decay * den;
            num / den
        })
        .collect()
}
