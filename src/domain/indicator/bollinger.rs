//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::price_series::PricePoint;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    points: &[PricePoint],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    if period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let mut values = Vec::with_capacity(points.len());
    let warmup = period - 1;
    let mult = stddev_mult_x100 as f64 / 100.0;

    for i in 0..points.len() {
        let valid = i >= warmup;

        let (upper, middle, lower) = if valid {
            let window = &points[i + 1 - period..=i];

            let middle_val: f64 = window.iter().map(|p| p.value).sum::<f64>() / period as f64;

            let variance: f64 = window
                .iter()
                .map(|p| {
                    let diff = p.value - middle_val;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;

            let stddev = variance.sqrt();
            (middle_val + mult * stddev, middle_val, middle_val - mult * stddev)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date: points[i].date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// (upper - lower) / middle per point; `None` during warmup or when the
/// middle band is zero.
pub fn bandwidth(series: &IndicatorSeries) -> Vec<Option<f64>> {
    series
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } if p.valid && middle != 0.0 => Some((upper - lower) / middle),
            _ => None,
        })
        .collect()
}
