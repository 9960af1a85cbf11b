//! Rebalance scheduling
//!
//! Period-end calendar dates on which the simulated portfolio resets to
//! target weights. A scheduled date only fires when a trading day falls on
//! exactly that date; there is no snapping to the nearest trading day.

use crate::error::{BacktestError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rebalance frequency policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    /// Year-end (December 31st) of every year in range
    #[default]
    Annual,
    /// Last calendar day of every month in range
    Monthly,
}

impl RebalanceFrequency {
    /// Token used in configuration and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalanceFrequency {
    type Err = BacktestError;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual),
            "monthly" => Ok(Self::Monthly),
            _ => Err(BacktestError::InvalidFrequency(token.to_string())),
        }
    }
}

/// Ordered, deduplicated set of rebalance dates within `[start, end]`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RebalanceSchedule {
    frequency: RebalanceFrequency,
    dates: Vec<NaiveDate>,
}

impl RebalanceSchedule {
    /// Generate the period-end dates for `frequency` between `start` and `end` inclusive
    pub fn generate(start: NaiveDate, end: NaiveDate, frequency: RebalanceFrequency) -> Self {
        let mut dates = Vec::new();
        if start <= end {
            match frequency {
                RebalanceFrequency::Annual => {
                    for year in start.year()..=end.year() {
                        if let Some(date) = NaiveDate::from_ymd_opt(year, 12, 31) {
                            dates.push(date);
                        }
                    }
                }
                RebalanceFrequency::Monthly => {
                    let (mut year, mut month) = (start.year(), start.month());
                    while (year, month) <= (end.year(), end.month()) {
                        if let Some(date) = month_end(year, month) {
                            dates.push(date);
                        }
                        if month == 12 {
                            year += 1;
                            month = 1;
                        } else {
                            month += 1;
                        }
                    }
                }
            }
        }
        dates.retain(|d| *d >= start && *d <= end);
        dates.dedup();

        Self { frequency, dates }
    }

    /// Parse `token` and generate the schedule
    pub fn from_token(start: NaiveDate, end: NaiveDate, token: &str) -> Result<Self> {
        let frequency = token.parse::<RebalanceFrequency>()?;
        Ok(Self::generate(start, end, frequency))
    }

    /// Frequency this schedule was generated from
    pub fn frequency(&self) -> RebalanceFrequency {
        self.frequency
    }

    /// Scheduled dates in ascending order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Exact calendar-date membership
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
