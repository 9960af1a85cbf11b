//! Benchmark rescaling to the portfolio's starting capital

use crate::error::RunWarning;
use crate::prices::PriceSeries;
use crate::series::ValueSeries;
use chrono::NaiveDate;
use tracing::warn;

/// Buy-and-hold rescaling of a benchmark price series
#[derive(Debug, Clone)]
pub struct BenchmarkNormalizer {
    initial_capital: f64,
}

impl BenchmarkNormalizer {
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    /// `price[t] * (initial_capital / price[0])`
    ///
    /// `None` when there is no usable first price.
    pub fn normalize(&self, prices: &PriceSeries) -> Option<ValueSeries> {
        let base = prices.points().iter().find_map(|(_, p)| *p)?;
        if !base.is_finite() || base <= 0.0 {
            return None;
        }
        let scale = self.initial_capital / base;
        Some(ValueSeries::new(
            prices
                .points()
                .iter()
                .filter_map(|(d, p)| p.map(|p| (*d, p * scale)))
                .collect(),
        ))
    }

    /// Normalised benchmark, or a flat series at initial capital over `dates`
    /// together with a `BenchmarkUnavailable` warning
    pub fn normalize_or_flat(
        &self,
        symbol: &str,
        prices: Option<&PriceSeries>,
        dates: &[NaiveDate],
    ) -> (ValueSeries, Option<RunWarning>) {
        match prices.and_then(|p| self.normalize(p)) {
            Some(series) => (series, None),
            None => {
                warn!("Could not price benchmark {}, substituting a flat series", symbol);
                (
                    ValueSeries::flat(dates, self.initial_capital),
                    Some(RunWarning::BenchmarkUnavailable {
                        symbol: symbol.to_string(),
                    }),
                )
            }
        }
    }
}
