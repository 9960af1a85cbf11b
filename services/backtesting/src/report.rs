//! Text rendering of backtest and screening results

use crate::engine::BacktestResult;
use crate::metrics::MetricsResult;
use crate::screening::{Allocation, ScreenOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const COLUMNS: [&str; 11] = [
    "Model",
    "Stocks",
    "Cumulative Return",
    "Excess Return",
    "Sharpe",
    "Sortino",
    "Max Drawdown",
    "Volatility",
    "Beta",
    "Alpha",
    "Information Ratio",
];

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// One formatted row of the comparison table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub stocks: usize,
    pub cumulative_return: String,
    pub excess_return: String,
    pub sharpe_ratio: String,
    pub sortino_ratio: String,
    pub max_drawdown: String,
    pub volatility: String,
    pub beta: String,
    pub alpha: String,
    pub information_ratio: String,
}

impl ComparisonRow {
    pub fn new(model: &str, metrics: &MetricsResult) -> Self {
        Self {
            model: model.to_string(),
            stocks: metrics.num_stocks(),
            cumulative_return: pct(metrics.cumulative_return),
            excess_return: pct(metrics.excess_return),
            sharpe_ratio: ratio(metrics.sharpe_ratio),
            sortino_ratio: ratio(metrics.sortino_ratio),
            max_drawdown: pct(metrics.max_drawdown),
            volatility: pct(metrics.volatility),
            beta: ratio(metrics.beta),
            alpha: ratio(metrics.jensens_alpha),
            information_ratio: ratio(metrics.information_ratio),
        }
    }

    /// Cells in column order
    pub fn cells(&self) -> [String; 11] {
        [
            self.model.clone(),
            self.stocks.to_string(),
            self.cumulative_return.clone(),
            self.excess_return.clone(),
            self.sharpe_ratio.clone(),
            self.sortino_ratio.clone(),
            self.max_drawdown.clone(),
            self.volatility.clone(),
            self.beta.clone(),
            self.alpha.clone(),
            self.information_ratio.clone(),
        ]
    }
}

/// Strategy comparison, one row per successful run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn from_results(results: &[BacktestResult]) -> Self {
        Self {
            rows: results
                .iter()
                .map(|r| ComparisonRow::new(&r.name, &r.metrics))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, model: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.model == model)
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 11]> = self.rows.iter().map(ComparisonRow::cells).collect();
        let mut widths = COLUMNS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header: Vec<String> = COLUMNS
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (name, w))| if i == 0 { format!("{name:<w$}") } else { format!("{name:>w$}") })
            .collect();
        writeln!(f, "{}", header.join("  "))?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("  "))?;

        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, w))| if i == 0 { format!("{cell:<w$}") } else { format!("{cell:>w$}") })
                .collect();
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}

/// Metrics block for a single run
#[derive(Debug)]
pub struct PerformanceSummary<'a> {
    result: &'a BacktestResult,
}

impl<'a> PerformanceSummary<'a> {
    pub fn new(result: &'a BacktestResult) -> Self {
        Self { result }
    }
}

impl fmt::Display for PerformanceSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        let m = &r.metrics;
        writeln!(f, "{}", r.name)?;
        writeln!(
            f,
            "  Period:                {} to {} ({} rebalancing, {} stocks)",
            m.metadata.start_date,
            m.metadata.end_date,
            m.metadata.rebalance_frequency,
            m.num_stocks()
        )?;
        if let (Some((_, first)), Some((_, last))) = (r.portfolio.first(), r.portfolio.last()) {
            writeln!(f, "  Portfolio value:       {first:.2} -> {last:.2}")?;
        }
        writeln!(f, "  Cumulative return:     {:.2}%", m.cumulative_return)?;
        writeln!(f, "  Benchmark return:      {:.2}%", m.benchmark_cumulative_return)?;
        writeln!(f, "  Excess return:         {:.2}%", m.excess_return)?;
        writeln!(f, "  Annualized return:     {:.2}%", m.annualized_return)?;
        writeln!(f, "  Volatility:            {:.2}%", m.volatility)?;
        writeln!(f, "  Sharpe ratio:          {:.2}", m.sharpe_ratio)?;
        writeln!(f, "  Sortino ratio:         {:.2}", m.sortino_ratio)?;
        writeln!(f, "  Max drawdown:          {:.2}%", m.max_drawdown)?;
        writeln!(f, "  Beta:                  {:.2}", m.beta)?;
        writeln!(f, "  Jensen's alpha:        {:.2}", m.jensens_alpha)?;
        writeln!(f, "  Information ratio:     {:.2}", m.information_ratio)?;
        writeln!(f, "  Rebalances:            {}", r.rebalances.len())?;
        for warning in &r.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        Ok(())
    }
}

/// Filter funnel and allocation for one screened strategy
#[derive(Debug)]
pub struct ScreeningReport<'a> {
    outcome: &'a ScreenOutcome,
    allocations: &'a [Allocation],
}

impl<'a> ScreeningReport<'a> {
    pub fn new(outcome: &'a ScreenOutcome, allocations: &'a [Allocation]) -> Self {
        Self {
            outcome,
            allocations,
        }
    }
}

impl fmt::Display for ScreeningReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.outcome.stats;
        writeln!(f, "{}", stats.model_name)?;
        writeln!(f, "  Universe:   {}", stats.initial_count)?;
        for step in &stats.filters_applied {
            writeln!(
                f,
                "  {:<24} passed {:>4}  failed {:>4}",
                step.filter, step.passed, step.failed
            )?;
        }
        writeln!(
            f,
            "  Qualifying: {} ({:.1}% pass rate)",
            stats.final_count, stats.pass_rate
        )?;
        for allocation in self.allocations {
            writeln!(f, "    {:<8} {:>6.2}%", allocation.ticker, allocation.allocation_pct)?;
        }
        Ok(())
    }
}
