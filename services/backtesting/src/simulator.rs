//! Equal-weight portfolio simulation
//!
//! Walks the aligned price table one trading day at a time. Holdings are
//! share counts fixed between rebalances; on a scheduled date the whole
//! book is sold at the previous trading day's value and re-bought at equal
//! weight at the day's prices. A symbol that
//! cannot be bought (missing or non-positive price) holds zero shares until
//! the next rebalance, and its slice of capital is not invested.

use crate::error::{BacktestError, Result};
use crate::prices::PriceTable;
use crate::schedule::RebalanceSchedule;
use crate::series::ValueSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Shares held in one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
}

/// Holdings owned by a single simulation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioState {
    holdings: Vec<Holding>,
    /// Capital earmarked at the last allocation for symbols that could not
    /// be bought. Not part of the valuation.
    cash: f64,
}

impl PortfolioState {
    fn empty(symbols: &[String]) -> Self {
        Self {
            holdings: symbols
                .iter()
                .map(|s| Holding {
                    symbol: s.clone(),
                    shares: 0.0,
                })
                .collect(),
            cash: 0.0,
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Shares held in `symbol`, zero when not part of the book
    pub fn shares(&self, symbol: &str) -> f64 {
        self.holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map_or(0.0, |h| h.shares)
    }

    /// Sum of `shares * price` on trading day `day`; a missing price counts as zero
    pub fn market_value(&self, table: &PriceTable, day: usize) -> f64 {
        self.holdings
            .iter()
            .filter_map(|h| table.price(&h.symbol, day).map(|p| h.shares * p))
            .sum()
    }

    /// Zero every position then buy `capital * weight` of each symbol priced on `day`
    ///
    /// Returns the symbols that could not be bought.
    fn allocate(&mut self, table: &PriceTable, day: usize, capital: f64, weight: f64) -> Vec<String> {
        let mut unfilled = Vec::new();
        self.cash = 0.0;
        for holding in &mut self.holdings {
            let allocation = capital * weight;
            match table.price(&holding.symbol, day) {
                Some(price) if price > 0.0 => holding.shares = allocation / price,
                _ => {
                    holding.shares = 0.0;
                    self.cash += allocation;
                    unfilled.push(holding.symbol.clone());
                }
            }
        }
        unfilled
    }
}

/// One executed rebalance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    pub date: NaiveDate,
    /// Portfolio value recorded on the previous trading day, re-bought in full
    pub value_before: f64,
    /// Value of the book right after re-buying
    pub value_after: f64,
    /// Symbols left at zero shares for lack of a valid price
    pub unfilled: Vec<String>,
}

/// Output of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Daily portfolio values, one per trading day
    pub values: ValueSeries,
    /// Symbols that took part (had at least one price)
    pub symbols: Vec<String>,
    /// Requested symbols dropped for having no price at all
    pub dropped: Vec<String>,
    pub rebalances: Vec<RebalanceEvent>,
    /// Scheduled dates that are not trading days and therefore never fired
    pub missed_rebalances: Vec<NaiveDate>,
    pub final_state: PortfolioState,
}

/// Equal-weight, scheduled-rebalance portfolio simulator
#[derive(Debug, Clone)]
pub struct PortfolioSimulator {
    initial_capital: f64,
}

impl PortfolioSimulator {
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    /// Simulate an equal-weight book of `symbols` over `table`
    pub fn run(
        &self,
        table: &PriceTable,
        symbols: &[String],
        schedule: &RebalanceSchedule,
    ) -> Result<Simulation> {
        if table.dates().is_empty() {
            return Err(BacktestError::no_data("price table has no trading days"));
        }

        let mut active: Vec<String> = Vec::with_capacity(symbols.len());
        let mut dropped = Vec::new();
        for symbol in symbols {
            if active.contains(symbol) || dropped.contains(symbol) {
                continue;
            }
            if table.has_data(symbol) {
                active.push(symbol.clone());
            } else {
                warn!("{} has no price data in range, excluded from the portfolio", symbol);
                dropped.push(symbol.clone());
            }
        }
        if active.is_empty() {
            return Err(BacktestError::no_data(format!(
                "none of {} symbols has price data",
                symbols.len()
            )));
        }

        let weight = 1.0 / active.len() as f64;
        let dates = table.dates();
        info!(
            "Simulating {} symbols over {} trading days ({} to {})",
            active.len(),
            dates.len(),
            dates[0],
            dates[dates.len() - 1]
        );

        let mut state = PortfolioState::empty(&active);
        let unfilled = state.allocate(table, 0, self.initial_capital, weight);
        if !unfilled.is_empty() {
            debug!("No opening price for {:?}, left uninvested", unfilled);
        }

        let mut values: Vec<(NaiveDate, f64)> = Vec::with_capacity(dates.len());
        let mut rebalances = Vec::new();
        for (day, date) in dates.iter().enumerate() {
            // No prior value on day 0, so the opening allocation stands
            let previous = values.last().map(|(_, value)| *value);
            if let Some(value_before) = previous.filter(|_| schedule.contains(*date)) {
                let unfilled = state.allocate(table, day, value_before, weight);
                let value_after = state.market_value(table, day);
                debug!(
                    "Rebalanced on {}: {:.2} -> {:.2} ({} unfilled)",
                    date,
                    value_before,
                    value_after,
                    unfilled.len()
                );
                rebalances.push(RebalanceEvent {
                    date: *date,
                    value_before,
                    value_after,
                    unfilled,
                });
            }
            values.push((*date, state.market_value(table, day)));
        }

        let missed_rebalances: Vec<NaiveDate> = schedule
            .dates()
            .iter()
            .filter(|d| dates.binary_search(*d).is_err())
            .copied()
            .collect();
        for date in &missed_rebalances {
            debug!("Scheduled rebalance {} is not a trading day, skipped", date);
        }

        Ok(Simulation {
            values: ValueSeries::new(values),
            symbols: active,
            dropped,
            rebalances,
            missed_rebalances,
            final_state: state,
        })
    }
}
