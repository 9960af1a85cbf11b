//! Side-by-side comparison of several strategies
//!
//! Each strategy is backtested independently with the same configuration.
//! Run-level failures never abort the comparison: the strategy is recorded
//! as skipped with a reason and the remaining strategies still run.

use crate::config::BacktestConfig;
use crate::engine::{BacktestEngine, BacktestResult};
use crate::error::{ErrorKind, Result};
use crate::prices::PriceSource;
use crate::report::ComparisonTable;
use crate::screening::{ScreenOutcome, Strategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A named list of symbols to hold at equal weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPortfolio {
    pub name: String,
    pub symbols: Vec<String>,
}

impl StrategyPortfolio {
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            symbols,
        }
    }

    /// Portfolio of the tickers that passed a screen
    pub fn from_screen(strategy: Strategy, outcome: &ScreenOutcome) -> Self {
        Self::new(strategy.name(), outcome.tickers())
    }
}

/// A strategy that could not be backtested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStrategy {
    pub name: String,
    pub kind: Option<ErrorKind>,
    pub reason: String,
}

/// Results of a comparison run, in input order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comparison {
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedStrategy>,
}

impl Comparison {
    /// Result for the strategy called `name`
    pub fn get(&self, name: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Fixed-precision table, one row per successful strategy
    pub fn table(&self) -> ComparisonTable {
        ComparisonTable::from_results(&self.results)
    }

    fn record(&mut self, name: &str, outcome: Result<BacktestResult>) {
        match outcome {
            Ok(result) => {
                info!(
                    "{}: cumulative return {:.2}%, Sharpe {:.2}, max drawdown {:.2}%",
                    name,
                    result.metrics.cumulative_return,
                    result.metrics.sharpe_ratio,
                    result.metrics.max_drawdown
                );
                self.results.push(result);
            }
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                self.skipped.push(SkippedStrategy {
                    name: name.to_string(),
                    kind: Some(e.kind()),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Runs the same backtest configuration over many strategies
#[derive(Debug, Clone)]
pub struct StrategyComparator {
    engine: BacktestEngine,
}

impl StrategyComparator {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            engine: BacktestEngine::new(config),
        }
    }

    /// Backtest every strategy sequentially
    pub fn compare<S>(&self, strategies: &[StrategyPortfolio], source: &S) -> Comparison
    where
        S: PriceSource + ?Sized,
    {
        let mut comparison = Comparison::default();
        for strategy in strategies {
            let outcome = self.engine.run(&strategy.name, &strategy.symbols, source);
            comparison.record(&strategy.name, outcome);
        }
        comparison
    }

    /// Backtest every strategy on its own blocking task
    ///
    /// Produces the same results as `compare`, in input order.
    pub async fn compare_concurrent<S>(
        &self,
        strategies: &[StrategyPortfolio],
        source: Arc<S>,
    ) -> Comparison
    where
        S: PriceSource + ?Sized + 'static,
    {
        let handles: Vec<_> = strategies
            .iter()
            .map(|strategy| {
                let engine = self.engine.clone();
                let source = Arc::clone(&source);
                let strategy = strategy.clone();
                tokio::task::spawn_blocking(move || {
                    engine.run(&strategy.name, &strategy.symbols, source.as_ref())
                })
            })
            .collect();

        let mut comparison = Comparison::default();
        for (strategy, handle) in strategies.iter().zip(handles) {
            match handle.await {
                Ok(outcome) => comparison.record(&strategy.name, outcome),
                Err(e) => {
                    warn!("Backtest task for {} failed: {}", strategy.name, e);
                    comparison.skipped.push(SkippedStrategy {
                        name: strategy.name.clone(),
                        kind: None,
                        reason: format!("backtest task failed: {e}"),
                    });
                }
            }
        }
        comparison
    }
}
