//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three EMAs use adjusted weighting with no minimum period, so every
//! point is valid from the first bar. Callers decide how much history is
//! enough.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::price_series::PricePoint;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    points: &[PricePoint],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if points.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let ema_fast = ema_values(points.iter().map(|p| p.value), fast);
    let ema_slow = ema_values(points.iter().map(|p| p.value), slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(macd_line.iter().copied(), signal_period);

    let values = points
        .iter()
        .zip(macd_line.iter().zip(&signal_line))
        .map(|(p, (&line, &signal))| IndicatorPoint {
            date: p.date,
            valid: true,
            value: IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(points: &[PricePoint]) -> IndicatorSeries {
    calculate_macd(points, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

/// Histogram column of a MACD series.
pub fn histogram(series: &IndicatorSeries) -> Vec<f64> {
    series
        .values
        .iter()
        .filter_map(|p| match p.value {
            IndicatorValue::Macd { histogram, .. } => Some(histogram),
            _ => None,
        })
        .collect()
}
