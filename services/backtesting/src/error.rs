//! Error types for the backtesting engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backtest error types
#[derive(Error, Debug)]
pub enum BacktestError {
    /// Rebalance frequency token is not one of the recognised policies
    #[error("Invalid rebalance frequency '{0}': expected 'annual' or 'monthly'")]
    InvalidFrequency(String),

    /// Numeric configuration is inconsistent
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// No usable price data for the requested run
    #[error("No price data available: {reason}")]
    DataUnavailable {
        /// Why the run has nothing to simulate
        reason: String,
    },

    /// A price series violates its ordering invariant
    #[error("Invalid price data for {symbol}: {reason}")]
    InvalidPriceData {
        /// Offending symbol
        symbol: String,
        /// Description of the violation
        reason: String,
    },

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Date parsing error
    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),
}

/// Coarse classification used when a run is reported as skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Invalid frequency or configuration
    Configuration,
    /// Nothing to simulate
    DataUnavailable,
    /// Malformed input files or series
    Input,
}

impl BacktestError {
    /// Build a `Configuration` error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a `DataUnavailable` error
    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFrequency(_) | Self::Configuration { .. } => ErrorKind::Configuration,
            Self::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            Self::InvalidPriceData { .. }
            | Self::Csv(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::DateParse(_) => ErrorKind::Input,
        }
    }
}

/// Non-fatal conditions that degrade a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunWarning {
    /// Benchmark prices missing; a flat series at initial capital was used
    BenchmarkUnavailable {
        /// Benchmark symbol that could not be priced
        symbol: String,
    },
    /// Requested symbols excluded for having no price data
    SymbolsDropped {
        /// Excluded symbols
        symbols: Vec<String>,
    },
    /// Scheduled rebalance dates that are not trading days
    RebalancesSkipped {
        /// Dates that never fired
        dates: Vec<chrono::NaiveDate>,
    },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BenchmarkUnavailable { symbol } => {
                write!(f, "benchmark {symbol} unavailable, using flat series")
            }
            Self::SymbolsDropped { symbols } => {
                write!(f, "no price data for {}", symbols.join(", "))
            }
            Self::RebalancesSkipped { dates } => {
                write!(f, "{} scheduled rebalance date(s) were not trading days", dates.len())
            }
        }
    }
}

/// Type alias for backtest results
pub type Result<T> = std::result::Result<T, BacktestError>;
