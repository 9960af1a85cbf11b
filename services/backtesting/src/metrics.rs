//! Performance metrics over portfolio and benchmark value series
//!
//! Every statistic works on simple periodic returns whose first element is
//! zero. Percent-valued metrics (cumulative, excess, volatility, drawdown,
//! alpha) are scaled by 100; ratios are not.
//!
//! Each metric has a `try_*` form returning `None` when the statistic is
//! mathematically undefined and a plain form that substitutes the fixed
//! fallback (0.0, or 1.0 for beta).

use crate::schedule::RebalanceFrequency;
use crate::series::ValueSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Trading days per year for daily sampling
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Annual risk-free rate used when none is configured
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Neutral beta reported when beta is undefined
pub const NEUTRAL_BETA: f64 = 1.0;

/// Names of the reported statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CumulativeReturn,
    BenchmarkCumulativeReturn,
    AnnualizedReturn,
    Volatility,
    SharpeRatio,
    SortinoRatio,
    MaxDrawdown,
    Beta,
    JensensAlpha,
    InformationRatio,
}

/// Descriptive data about the run a `MetricsResult` belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rebalance_frequency: RebalanceFrequency,
    /// Constituents that took part in the simulation
    pub symbols: Vec<String>,
}

/// Statistics for one backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Portfolio cumulative return (%)
    pub cumulative_return: f64,
    /// Benchmark cumulative return (%)
    pub benchmark_cumulative_return: f64,
    /// Portfolio minus benchmark cumulative return (percentage points)
    pub excess_return: f64,
    /// Compound annual growth rate (%)
    pub annualized_return: f64,
    /// Annualised volatility (%)
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Deepest peak-to-trough decline (%), never positive
    pub max_drawdown: f64,
    pub beta: f64,
    /// Per-period Jensen's alpha (%)
    pub jensens_alpha: f64,
    pub information_ratio: f64,

    pub metadata: RunMetadata,
    /// Metrics that resolved to their fallback value
    pub fallbacks: BTreeSet<MetricKind>,
}

impl MetricsResult {
    pub fn num_stocks(&self) -> usize {
        self.metadata.symbols.len()
    }

    /// True when `kind` was undefined and carries its fallback value
    pub fn is_fallback(&self, kind: MetricKind) -> bool {
        self.fallbacks.contains(&kind)
    }
}

/// Computes `MetricsResult` from value series
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    risk_free_rate: f64,
    periods_per_year: u32,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR)
    }
}

impl PerformanceAnalyzer {
    pub fn new(risk_free_rate: f64, periods_per_year: u32) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
        }
    }

    /// Compute every metric for `portfolio` against `benchmark`
    pub fn calculate(
        &self,
        portfolio: &ValueSeries,
        benchmark: &ValueSeries,
        metadata: RunMetadata,
    ) -> MetricsResult {
        let portfolio_values = portfolio.values();
        let benchmark_values = benchmark.values();
        let portfolio_returns = periodic_returns(&portfolio_values);
        let dated_portfolio = dated_returns(portfolio);
        let dated_benchmark = dated_returns(benchmark);
        let (rf, ppy) = (self.risk_free_rate, self.periods_per_year);

        let mut fallbacks = BTreeSet::new();
        let mut resolve = |kind: MetricKind, value: Option<f64>, fallback: f64| {
            value.unwrap_or_else(|| {
                fallbacks.insert(kind);
                fallback
            })
        };

        let cumulative_return = resolve(
            MetricKind::CumulativeReturn,
            try_cumulative_return(&portfolio_values),
            0.0,
        );
        let benchmark_cumulative_return = resolve(
            MetricKind::BenchmarkCumulativeReturn,
            try_cumulative_return(&benchmark_values),
            0.0,
        );
        let annualized_return = resolve(
            MetricKind::AnnualizedReturn,
            try_annualized_return(&portfolio_values, ppy),
            0.0,
        );
        let volatility = resolve(
            MetricKind::Volatility,
            try_volatility(&portfolio_returns, ppy),
            0.0,
        );
        let sharpe_ratio = resolve(
            MetricKind::SharpeRatio,
            try_sharpe_ratio(&portfolio_returns, rf, ppy),
            0.0,
        );
        let sortino_ratio = resolve(
            MetricKind::SortinoRatio,
            try_sortino_ratio(&portfolio_returns, rf, ppy),
            0.0,
        );
        let max_drawdown = max_drawdown(&portfolio_values);
        let beta = resolve(
            MetricKind::Beta,
            try_beta(&dated_portfolio, &dated_benchmark),
            NEUTRAL_BETA,
        );
        let jensens_alpha = resolve(
            MetricKind::JensensAlpha,
            try_jensens_alpha(&dated_portfolio, &dated_benchmark, rf, ppy),
            0.0,
        );
        let information_ratio = resolve(
            MetricKind::InformationRatio,
            try_information_ratio(&dated_portfolio, &dated_benchmark),
            0.0,
        );

        if !fallbacks.is_empty() {
            debug!("Metrics resolved to fallback values: {:?}", fallbacks);
        }
        info!(
            "Return: {:.2}%, Sharpe: {:.2}, Max drawdown: {:.2}%",
            cumulative_return, sharpe_ratio, max_drawdown
        );

        MetricsResult {
            cumulative_return,
            benchmark_cumulative_return,
            excess_return: cumulative_return - benchmark_cumulative_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            beta,
            jensens_alpha,
            information_ratio,
            metadata,
            fallbacks,
        }
    }
}

/// Simple percentage change between consecutive values, first element zero
///
/// A period whose prior value is zero has a return of zero.
pub fn periodic_returns(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(values.len());
    returns.push(0.0);
    returns.extend(values.windows(2).map(|w| {
        if w[0] == 0.0 {
            0.0
        } else {
            w[1] / w[0] - 1.0
        }
    }));
    returns
}

/// Periodic returns keyed by date
pub fn dated_returns(series: &ValueSeries) -> Vec<(NaiveDate, f64)> {
    series
        .dates()
        .into_iter()
        .zip(periodic_returns(&series.values()))
        .collect()
}

/// Inner join of two date-sorted return series, dropping NaN entries
pub fn align_returns(
    portfolio: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
) -> (Vec<f64>, Vec<f64>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < portfolio.len() && j < benchmark.len() {
        let (pd, pv) = portfolio[i];
        let (bd, bv) = benchmark[j];
        match pd.cmp(&bd) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if !pv.is_nan() && !bv.is_nan() {
                    left.push(pv);
                    right.push(bv);
                }
                i += 1;
                j += 1;
            }
        }
    }
    (left, right)
}

pub fn try_cumulative_return(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    let last = *values.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last / first - 1.0) * 100.0)
}

/// `(last / first - 1) * 100`
pub fn cumulative_return(values: &[f64]) -> f64 {
    try_cumulative_return(values).unwrap_or(0.0)
}

pub fn try_annualized_return(values: &[f64], periods_per_year: u32) -> Option<f64> {
    let first = *values.first()?;
    let last = *values.last()?;
    let periods = values.len().checked_sub(1).filter(|p| *p > 0)?;
    if first <= 0.0 || last < 0.0 || periods_per_year == 0 {
        return None;
    }
    let years = periods as f64 / f64::from(periods_per_year);
    Some(((last / first).powf(1.0 / years) - 1.0) * 100.0)
}

/// Compound annual growth rate in percent
pub fn annualized_return(values: &[f64], periods_per_year: u32) -> f64 {
    try_annualized_return(values, periods_per_year).unwrap_or(0.0)
}

pub fn try_volatility(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    let std = sample_std(returns)?;
    Some(std * f64::from(periods_per_year).sqrt() * 100.0)
}

/// `stdev(returns) * sqrt(periods_per_year) * 100`
pub fn volatility(returns: &[f64], periods_per_year: u32) -> f64 {
    try_volatility(returns, periods_per_year).unwrap_or(0.0)
}

pub fn try_sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    let std = sample_std(returns).filter(|s| *s != 0.0)?;
    let excess = mean_excess(returns, risk_free_rate, periods_per_year)?;
    Some(f64::from(periods_per_year).sqrt() * excess / std)
}

/// `sqrt(ppy) * mean(returns - rf/ppy) / stdev(returns)`
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> f64 {
    try_sharpe_ratio(returns, risk_free_rate, periods_per_year).unwrap_or(0.0)
}

pub fn try_sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = sample_std(&downside).filter(|s| *s != 0.0)?;
    let excess = mean_excess(returns, risk_free_rate, periods_per_year)?;
    Some(f64::from(periods_per_year).sqrt() * excess / downside_std)
}

/// Sharpe with the stdev of negative returns as denominator
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> f64 {
    try_sortino_ratio(returns, risk_free_rate, periods_per_year).unwrap_or(0.0)
}

/// Deepest decline from the running peak, in percent (zero or negative)
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for value in values {
        peak = peak.max(*value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst * 100.0
}

pub fn try_beta(portfolio: &[(NaiveDate, f64)], benchmark: &[(NaiveDate, f64)]) -> Option<f64> {
    let (p, b) = align_returns(portfolio, benchmark);
    beta_of_aligned(&p, &b)
}

/// `cov(portfolio, benchmark) / var(benchmark)` over matching dates
pub fn beta(portfolio: &[(NaiveDate, f64)], benchmark: &[(NaiveDate, f64)]) -> f64 {
    try_beta(portfolio, benchmark).unwrap_or(NEUTRAL_BETA)
}

pub fn try_jensens_alpha(
    portfolio: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Option<f64> {
    let (p, b) = align_returns(portfolio, benchmark);
    let beta = beta_of_aligned(&p, &b)?;
    let rf = per_period_rate(risk_free_rate, periods_per_year)?;
    let (mean_p, mean_b) = (p.as_slice().mean(), b.as_slice().mean());
    Some((mean_p - (rf + beta * (mean_b - rf))) * 100.0)
}

/// Per-period Jensen's alpha in percent
pub fn jensens_alpha(
    portfolio: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
    risk_free_rate: f64,
    periods_per_year: u32,
) -> f64 {
    try_jensens_alpha(portfolio, benchmark, risk_free_rate, periods_per_year).unwrap_or(0.0)
}

pub fn try_information_ratio(
    portfolio: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
) -> Option<f64> {
    let (p, b) = align_returns(portfolio, benchmark);
    let active: Vec<f64> = p.iter().zip(&b).map(|(p, b)| p - b).collect();
    let tracking_error = sample_std(&active).filter(|s| *s != 0.0)?;
    Some(active.as_slice().mean() / tracking_error)
}

/// `mean(active) / stdev(active)` over matching dates
pub fn information_ratio(portfolio: &[(NaiveDate, f64)], benchmark: &[(NaiveDate, f64)]) -> f64 {
    try_information_ratio(portfolio, benchmark).unwrap_or(0.0)
}

fn beta_of_aligned(portfolio: &[f64], benchmark: &[f64]) -> Option<f64> {
    if portfolio.len() < 2 {
        return None;
    }
    let variance = benchmark.variance();
    if variance == 0.0 || !variance.is_finite() {
        return None;
    }
    Some(portfolio.covariance(benchmark) / variance)
}

fn mean_excess(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let rf = per_period_rate(risk_free_rate, periods_per_year)?;
    Some(returns.iter().map(|r| r - rf).collect::<Vec<f64>>().mean())
}

fn per_period_rate(risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    (periods_per_year > 0).then(|| risk_free_rate / f64::from(periods_per_year))
}

fn sample_std(values: &[f64]) -> Option<f64> {
    (values.len() >= 2).then(|| values.std_dev())
}
