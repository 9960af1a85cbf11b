//! Single-strategy backtest run

use crate::benchmark::BenchmarkNormalizer;
use crate::config::BacktestConfig;
use crate::error::{BacktestError, Result, RunWarning};
use crate::metrics::{MetricsResult, PerformanceAnalyzer, RunMetadata};
use crate::prices::PriceSource;
use crate::schedule::RebalanceSchedule;
use crate::series::ValueSeries;
use crate::simulator::{PortfolioSimulator, PortfolioState, RebalanceEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything a caller receives from one backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub name: String,
    pub portfolio: ValueSeries,
    /// Benchmark rescaled to the initial capital
    pub benchmark: ValueSeries,
    pub metrics: MetricsResult,
    /// Schedule the run was generated with
    pub schedule: RebalanceSchedule,
    /// Rebalances that actually fired
    pub rebalances: Vec<RebalanceEvent>,
    pub final_portfolio: PortfolioState,
    pub warnings: Vec<RunWarning>,
}

/// Backtesting engine for equal-weight strategy evaluation
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        info!("Initializing BacktestEngine with config: {:?}", config);
        Self { config }
    }

    /// Backtest an equal-weight portfolio of `symbols`
    pub fn run<S>(&self, name: &str, symbols: &[String], source: &S) -> Result<BacktestResult>
    where
        S: PriceSource + ?Sized,
    {
        self.config.validate()?;
        if symbols.is_empty() {
            return Err(BacktestError::no_data(format!("{name}: no tickers provided")));
        }
        let (start, end) = (self.config.start_date, self.config.end_date);
        info!(
            "Backtesting {} ({} tickers) from {} to {} with {} rebalancing",
            name,
            symbols.len(),
            start,
            end,
            self.config.rebalance_frequency
        );

        let prices = source.fetch(symbols, start, end)?;
        let schedule = RebalanceSchedule::generate(start, end, self.config.rebalance_frequency);
        let simulation =
            PortfolioSimulator::new(self.config.initial_capital).run(&prices, symbols, &schedule)?;

        let mut warnings = Vec::new();
        if !simulation.dropped.is_empty() {
            warnings.push(RunWarning::SymbolsDropped {
                symbols: simulation.dropped.clone(),
            });
        }
        if !simulation.missed_rebalances.is_empty() {
            info!(
                "{} scheduled rebalance date(s) fell on non-trading days",
                simulation.missed_rebalances.len()
            );
            warnings.push(RunWarning::RebalancesSkipped {
                dates: simulation.missed_rebalances.clone(),
            });
        }

        let benchmark_symbol = &self.config.benchmark_symbol;
        let benchmark_prices = source.fetch_series(benchmark_symbol, start, end);
        let (benchmark, benchmark_warning) = BenchmarkNormalizer::new(self.config.initial_capital)
            .normalize_or_flat(benchmark_symbol, benchmark_prices.as_ref(), prices.dates());
        warnings.extend(benchmark_warning);

        let analyzer =
            PerformanceAnalyzer::new(self.config.risk_free_rate, self.config.periods_per_year);
        let metrics = analyzer.calculate(
            &simulation.values,
            &benchmark,
            RunMetadata {
                start_date: start,
                end_date: end,
                rebalance_frequency: self.config.rebalance_frequency,
                symbols: simulation.symbols.clone(),
            },
        );

        Ok(BacktestResult {
            name: name.to_string(),
            portfolio: simulation.values,
            benchmark,
            metrics,
            schedule,
            rebalances: simulation.rebalances,
            final_portfolio: simulation.final_state,
            warnings,
        })
    }
}
