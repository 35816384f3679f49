//! Commodity Channel Index.
//!
//! CCI[i] = (TP[i] - SMA(TP, n)[i]) / (0.015 * MAD(TP, n)[i])
//! where TP = (high + low + close) / 3 and MAD is the mean absolute deviation
//! of TP around its own window mean.
//!
//! Warmup: first (n-1) bars are invalid. A window with zero deviation has no
//! defined CCI and is marked invalid as well.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PricePoint;

pub const DEFAULT_WINDOW: usize = 20;
pub const CCI_CONSTANT: f64 = 0.015;

/// Synthetic OHLC built from a close-only series.
///
/// Funds publish a single daily price, so high and low are approximated as
/// `close ± spread`. The resulting bars are not market data. With a symmetric
/// spread the typical price equals the close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRange {
    pub spread: f64,
}

impl Default for SyntheticRange {
    fn default() -> Self {
        Self { spread: 1.0 }
    }
}

impl SyntheticRange {
    pub fn bars(&self, points: &[PricePoint]) -> Vec<OhlcvBar> {
        points
            .iter()
            .map(|p| OhlcvBar {
                date: p.date,
                open: p.value,
                high: p.value + self.spread,
                low: p.value - self.spread,
                close: p.value,
                volume: 0,
            })
            .collect()
    }
}

pub fn calculate_cci(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    if window == 0 {
        return IndicatorSeries::empty(IndicatorType::Cci(window));
    }

    let typical: Vec<f64> = bars.iter().map(OhlcvBar::typical_price).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let cci = if i + 1 >= window {
            let slice = &typical[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let mad = slice.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / window as f64;
            if mad > 0.0 {
                Some((typical[i] - mean) / (CCI_CONSTANT * mad))
            } else {
                None
            }
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: cci.is_some(),
            value: IndicatorValue::Simple(cci.unwrap_or(0.0)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Cci(window),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn make_points(prices: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &value)| PricePoint {
                date: start + Duration::days(i as i64),
                value,
            })
            .collect()
    }

    #[test]
    fn synthetic_range_brackets_close() {
        let bars = SyntheticRange::default().bars(&make_points(&[10.0]));
        assert_eq!(bars[0].high, 11.0);
        assert_eq!(bars[0].low, 9.0);
        assert_relative_eq!(bars[0].typical_price(), 10.0);
    }

    #[test]
    fn cci_warmup() {
        let prices: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let bars = SyntheticRange::default().bars(&make_points(&prices));
        let series = calculate_cci(&bars, 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn cci_flat_window_is_invalid() {
        let bars = SyntheticRange::default().bars(&make_points(&[5.0; 4]));
        let series = calculate_cci(&bars, 3);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn cci_known_value() {
        // TP window [1, 2, 3]: mean 2, MAD 2/3, CCI = 1 / (0.015 * 2/3) = 100
        let bars = SyntheticRange::default().bars(&make_points(&[1.0, 2.0, 3.0]));
        let series = calculate_cci(&bars, 3);
        assert_relative_eq!(series.latest_simple().unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn cci_sharp_drop_is_deeply_negative() {
        let mut prices = vec![100.0; 20];
        prices.push(90.0);
        let bars = SyntheticRange::default().bars(&make_points(&prices));
        let series = calculate_cci(&bars, DEFAULT_WINDOW);
        assert!(series.latest_simple().unwrap() < -100.0);
    }

    #[test]
    fn cci_zero_window() {
        let bars = SyntheticRange::default().bars(&make_points(&[1.0]));
        assert!(calculate_cci(&bars, 0).values.is_empty());
    }
}
