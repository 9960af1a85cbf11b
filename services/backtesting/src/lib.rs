//! Equity portfolio backtesting for ShrivenQuant
//!
//! Screens a universe of stocks on fundamentals, holds each qualifying set
//! at equal weight with periodic rebalancing, and measures the result
//! against a benchmark with standard risk-adjusted return statistics.
//!
//! The core is synchronous and single-threaded per run. Price data comes
//! from a [`PriceSource`]; nothing is written to disk.

pub mod benchmark;
pub mod comparator;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod prices;
pub mod report;
pub mod schedule;
pub mod screening;
pub mod series;
pub mod simulator;

pub use benchmark::BenchmarkNormalizer;
pub use comparator::{Comparison, SkippedStrategy, StrategyComparator, StrategyPortfolio};
pub use config::{AppConfig, BacktestConfig, ScreeningConfig};
pub use engine::{BacktestEngine, BacktestResult};
pub use error::{BacktestError, ErrorKind, Result, RunWarning};
pub use metrics::{MetricKind, MetricsResult, PerformanceAnalyzer, RunMetadata};
pub use prices::{InMemoryPriceSource, PriceSeries, PriceSource, PriceTable};
pub use report::{ComparisonTable, PerformanceSummary, ScreeningReport};
pub use schedule::{RebalanceFrequency, RebalanceSchedule};
pub use screening::{Fundamentals, ScreenOutcome, ScreeningCriteria, Strategy};
pub use series::ValueSeries;
pub use simulator::{PortfolioSimulator, PortfolioState, Simulation};
