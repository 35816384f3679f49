//! Individual scoring rules.
//!
//! Each rule is a pure function over already-sliced data. Short or empty input
//! and undefined numeric results (zero divisors, NaN) resolve to `false` or
//! `0`, never to a NaN comparison.

use crate::domain::indicator::bollinger::{self, bandwidth};
use crate::domain::indicator::cci::{self, SyntheticRange};
use crate::domain::indicator::macd::{calculate_macd_default, histogram};
use crate::domain::indicator::rolling::{rolling_max, rolling_mean, rolling_quantile};
use crate::domain::indicator::{calculate_bollinger, calculate_cci, calculate_ema, calculate_rsi};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PricePoint;

pub const EMA_SPAN: usize = 20;
pub const EMA_MIN_PERIODS: usize = 15;
pub const EMA_MIN_POINTS: usize = 20;

pub const MACD_MIN_POINTS: usize = 26;

pub const CCI_THRESHOLD: f64 = 100.0;

pub const HIGH_WINDOW: usize = 52;
pub const HIGH_TOLERANCE: f64 = 0.97;
pub const VOLUME_WINDOW: usize = 12;
pub const VOLUME_SHRINK: f64 = 0.85;

pub const BANDWIDTH_HISTORY: usize = 52;
pub const BANDWIDTH_QUANTILE: f64 = 0.25;

pub const RSI_PERIOD: usize = 14;
pub const WEEKLY_RSI_FLOOR: f64 = 50.0;
pub const DAILY_RSI_FLOOR: f64 = 55.0;

/// Angle in degrees of the relative change from `prev` to `curr`.
pub fn slope_degrees(prev: f64, curr: f64) -> f64 {
    ((curr - prev) / prev).atan().to_degrees()
}

/// EMA(20) of the series is flat or rising at its last point.
pub fn ema20_slope(points: &[PricePoint]) -> bool {
    if points.len() < EMA_MIN_POINTS {
        return false;
    }
    let ema = calculate_ema(points, EMA_SPAN, EMA_MIN_PERIODS);
    let (Some(prev), Some(curr)) = (ema.simple_from_end(1), ema.simple_from_end(0)) else {
        return false;
    };
    let slope = slope_degrees(prev, curr);
    !slope.is_nan() && slope >= 0.0
}

/// MACD histogram magnitude grew over each of the last two periods.
pub fn macd_expansion(points: &[PricePoint]) -> bool {
    if points.len() < MACD_MIN_POINTS {
        return false;
    }
    let hist = histogram(&calculate_macd_default(points));
    let [h2, h1, h0] = match hist.as_slice() {
        [.., a, b, c] => [a.abs(), b.abs(), c.abs()],
        _ => return false,
    };
    if !(h0.is_finite() && h1.is_finite() && h2.is_finite()) {
        return false;
    }
    h0 > h1 && h1 > h2
}

/// Daily CCI(20) crossing: `1` up through `-threshold`, `-1` down through
/// `+threshold`, otherwise `0`.
pub fn cci_breakthrough(points: &[PricePoint], threshold: f64) -> i8 {
    if points.len() < cci::DEFAULT_WINDOW {
        return 0;
    }
    let bars = SyntheticRange::default().bars(points);
    let series = calculate_cci(&bars, cci::DEFAULT_WINDOW);
    let (Some(prev), Some(curr)) = (series.simple_from_end(1), series.simple_from_end(0)) else {
        return 0;
    };

    if prev < -threshold && curr >= -threshold {
        1
    } else if prev > threshold && curr <= threshold {
        -1
    } else {
        0
    }
}

/// Fund trades near the ETF's 52-period closing high while ETF volume dries up.
pub fn volume_divergence(fund_close: f64, etf: &[OhlcvBar]) -> bool {
    if etf.is_empty() || !fund_close.is_finite() {
        return false;
    }
    let closes: Vec<f64> = etf.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = etf.iter().map(|b| b.volume as f64).collect();

    let (Some(Some(high)), Some(Some(avg_volume))) = (
        rolling_max(&closes, HIGH_WINDOW).last().copied(),
        rolling_mean(&volumes, VOLUME_WINDOW).last().copied(),
    ) else {
        return false;
    };
    let Some(latest_volume) = volumes.last().copied() else {
        return false;
    };

    let near_high = fund_close >= high * HIGH_TOLERANCE;
    let volume_shrinking = latest_volume < avg_volume * VOLUME_SHRINK;
    near_high && volume_shrinking
}

/// Latest Bollinger bandwidth sits below the 25th percentile of the trailing
/// 52 bandwidths.
pub fn volatility_filter(points: &[PricePoint]) -> bool {
    if points.len() < bollinger::DEFAULT_PERIOD {
        return false;
    }
    let bands = calculate_bollinger(
        points,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULT_X100,
    );
    let widths = bandwidth(&bands);
    let quantiles = rolling_quantile(&widths, BANDWIDTH_HISTORY, BANDWIDTH_QUANTILE);

    match (widths.last(), quantiles.last()) {
        (Some(Some(current)), Some(Some(q))) => current < q,
        _ => false,
    }
}

/// RSI(14) at the last point, if defined.
pub fn latest_rsi(points: &[PricePoint]) -> Option<f64> {
    calculate_rsi(points, RSI_PERIOD).latest_simple()
}

/// Weekly RSI above 50 and daily RSI above 55. An undefined RSI never
/// resonates.
pub fn rsi_resonates(weekly_rsi: Option<f64>, daily_rsi: Option<f64>) -> bool {
    matches!(
        (weekly_rsi, daily_rsi),
        (Some(w), Some(d)) if w > WEEKLY_RSI_FLOOR && d > DAILY_RSI_FLOOR
    )
}

pub fn rsi_resonance(weekly: &[PricePoint], daily: &[PricePoint]) -> bool {
    rsi_resonates(latest_rsi(weekly), latest_rsi(daily))
}
