//! Daily value series produced by simulation and benchmark normalisation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered `(date, value)` pairs; immutable once produced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl ValueSeries {
    /// Wrap points already ordered by date
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self { points }
    }

    /// Constant `value` on every date
    pub fn flat(dates: &[NaiveDate], value: f64) -> Self {
        Self::new(dates.iter().map(|d| (*d, value)).collect())
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
