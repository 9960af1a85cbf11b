//! Backtest and screening configuration

use crate::error::{BacktestError, Result};
use crate::metrics::{DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR};
use crate::schedule::RebalanceFrequency;
use crate::screening::{ScreeningCriteria, Strategy};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Benchmark used when none is configured (S&P 500 index)
pub const DEFAULT_BENCHMARK: &str = "^GSPC";

/// Capital each simulated portfolio starts with by default
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Configuration for a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub rebalance_frequency: RebalanceFrequency,
    pub risk_free_rate: f64,       // Annual risk-free rate
    pub periods_per_year: u32,     // 252 = daily sampling
    pub benchmark_symbol: String,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            rebalance_frequency: RebalanceFrequency::Annual,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            benchmark_symbol: DEFAULT_BENCHMARK.to_string(),
        }
    }
}

impl BacktestConfig {
    /// Reject configurations no run can use
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(BacktestError::config(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::config(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.periods_per_year == 0 {
            return Err(BacktestError::config("periods per year must be at least 1"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(BacktestError::config("risk-free rate must be finite"));
        }
        Ok(())
    }

    /// Same configuration with the frequency parsed from `token`
    pub fn with_frequency_token(mut self, token: &str) -> Result<Self> {
        self.rebalance_frequency = token.parse()?;
        Ok(self)
    }
}

/// Screening criteria per strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub strategies: BTreeMap<Strategy, ScreeningCriteria>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            strategies: Strategy::ALL
                .iter()
                .map(|s| (*s, s.default_criteria()))
                .collect(),
        }
    }
}

impl ScreeningConfig {
    /// Criteria for `strategy`, falling back to its defaults
    pub fn criteria(&self, strategy: Strategy) -> ScreeningCriteria {
        self.strategies
            .get(&strategy)
            .cloned()
            .unwrap_or_else(|| strategy.default_criteria())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestConfig,
    pub screening: ScreeningConfig,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.backtest.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
