//! Dated close-price series.
//!
//! A `PriceSeries` is strictly increasing by date. Non-trading days are simply
//! absent; nothing is zero-filled.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from unordered points.
    ///
    /// Non-finite values are dropped. When a date repeats, the last value wins.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.value.is_finite());
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        Self { points: deduped }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| PricePoint { date, value })
                .collect(),
        )
    }

    /// Close column of an OHLCV table.
    pub fn from_closes(bars: &[OhlcvBar]) -> Self {
        Self::from_pairs(bars.iter().map(|b| (b.date, b.close)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Points dated on or before `as_of`.
    pub fn as_of(&self, as_of: NaiveDate) -> &[PricePoint] {
        let end = self.points.partition_point(|p| p.date <= as_of);
        &self.points[..end]
    }
}
