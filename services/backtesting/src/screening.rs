//! Rule-based fundamental screening and equal-weight allocation
//!
//! Thresholds are inclusive. A stock missing a value that a filter reads
//! fails that filter.

use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Named screening strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Model 1: strictest quality screen
    StrictQuality,
    /// Model 2: relaxed profitability thresholds
    Moderate,
    /// Model 3: quality plus a forward P/E cap, relaxed FCF yield
    Valuation,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::StrictQuality, Self::Moderate, Self::Valuation];

    /// Display name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrictQuality => "Model 1 (Strict Quality)",
            Self::Moderate => "Model 2 (Moderate)",
            Self::Valuation => "Model 3 (Valuation)",
        }
    }

    pub fn default_criteria(&self) -> ScreeningCriteria {
        match self {
            Self::StrictQuality => ScreeningCriteria {
                name: self.name().to_string(),
                roe_min: Some(20.0),
                ebitda_margin_min: Some(20.0),
                revenue_cagr_5y_min: Some(8.0),
                fcf_yield_min: Some(4.0),
                debt_equity_max: Some(80.0),
                forward_pe_max: None,
            },
            Self::Moderate => ScreeningCriteria {
                name: self.name().to_string(),
                roe_min: Some(15.0),
                ebitda_margin_min: Some(15.0),
                revenue_cagr_5y_min: Some(8.0),
                fcf_yield_min: Some(4.0),
                debt_equity_max: Some(80.0),
                forward_pe_max: None,
            },
            Self::Valuation => ScreeningCriteria {
                name: self.name().to_string(),
                roe_min: Some(20.0),
                ebitda_margin_min: Some(20.0),
                revenue_cagr_5y_min: Some(8.0),
                fcf_yield_min: Some(3.0),
                debt_equity_max: None,
                forward_pe_max: Some(25.0),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive thresholds; `None` disables a filter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningCriteria {
    pub name: String,
    pub roe_min: Option<f64>,             // %
    pub ebitda_margin_min: Option<f64>,   // %
    pub revenue_cagr_5y_min: Option<f64>, // %
    pub fcf_yield_min: Option<f64>,       // %
    pub debt_equity_max: Option<f64>,     // %
    pub forward_pe_max: Option<f64>,
}

/// Fundamental metrics for one ticker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub ticker: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub ebitda_margin: Option<f64>,
    #[serde(default)]
    pub revenue_cagr_5y: Option<f64>,
    #[serde(default)]
    pub fcf_yield: Option<f64>,
    #[serde(default)]
    pub debt_equity: Option<f64>,
    #[serde(default)]
    pub forward_pe: Option<f64>,
}

impl Fundamentals {
    /// All metrics except forward P/E are present
    pub fn is_complete(&self) -> bool {
        [
            self.roe,
            self.ebitda_margin,
            self.fcf_yield,
            self.revenue_cagr_5y,
            self.debt_equity,
        ]
        .iter()
        .all(Option::is_some)
    }
}

/// Keep only tickers with a complete set of core metrics
pub fn filter_complete(universe: &[Fundamentals]) -> Vec<Fundamentals> {
    universe.iter().filter(|f| f.is_complete()).cloned().collect()
}

/// Load fundamentals from a CSV whose headers match the field names
pub fn load_fundamentals_csv(path: impl AsRef<Path>) -> Result<Vec<Fundamentals>> {
    let path = path.as_ref();
    info!("Loading fundamentals from: {}", path.display());
    read_fundamentals(std::fs::File::open(path)?)
}

pub fn read_fundamentals<R: Read>(reader: R) -> Result<Vec<Fundamentals>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize::<Fundamentals>() {
        rows.push(row?);
    }
    info!("Loaded fundamentals for {} tickers", rows.len());
    Ok(rows)
}

/// Outcome of a single filter step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStat {
    pub filter: String,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningStats {
    pub model_name: String,
    pub initial_count: usize,
    pub filters_applied: Vec<FilterStat>,
    pub final_count: usize,
    /// Share of the universe that qualified (%)
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenOutcome {
    pub qualifying: Vec<Fundamentals>,
    pub stats: ScreeningStats,
}

impl ScreenOutcome {
    /// Qualifying tickers in alphabetical order
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.qualifying.iter().map(|f| f.ticker.clone()).collect();
        tickers.sort();
        tickers
    }
}

enum Bound {
    Min,
    Max,
}

type Accessor = fn(&Fundamentals) -> Option<f64>;

/// Apply `criteria` to `universe` in fixed filter order
pub fn screen(universe: &[Fundamentals], criteria: &ScreeningCriteria) -> ScreenOutcome {
    let filters: [(&str, &str, Option<f64>, Bound, Accessor); 6] = [
        ("ROE", "%", criteria.roe_min, Bound::Min, |f| f.roe),
        ("EBITDA Margin", "%", criteria.ebitda_margin_min, Bound::Min, |f| f.ebitda_margin),
        ("Revenue CAGR 5Y", "%", criteria.revenue_cagr_5y_min, Bound::Min, |f| f.revenue_cagr_5y),
        ("FCF Yield", "%", criteria.fcf_yield_min, Bound::Min, |f| f.fcf_yield),
        ("Debt/Equity", "%", criteria.debt_equity_max, Bound::Max, |f| f.debt_equity),
        ("Forward P/E", "", criteria.forward_pe_max, Bound::Max, |f| f.forward_pe),
    ];

    let initial_count = universe.len();
    let mut remaining: Vec<Fundamentals> = universe.to_vec();
    let mut filters_applied = Vec::new();

    for (label, unit, threshold, bound, value) in filters {
        let Some(threshold) = threshold else {
            continue;
        };
        let before = remaining.len();
        remaining.retain(|f| match (value(f), &bound) {
            (Some(v), Bound::Min) => v >= threshold,
            (Some(v), Bound::Max) => v <= threshold,
            (None, _) => false,
        });
        let op = match bound {
            Bound::Min => ">=",
            Bound::Max => "<=",
        };
        let stat = FilterStat {
            filter: format!("{label} {op} {threshold:.1}{unit}"),
            passed: remaining.len(),
            failed: before - remaining.len(),
        };
        debug!("{}: {} passed, {} failed", stat.filter, stat.passed, stat.failed);
        filters_applied.push(stat);
    }

    let final_count = remaining.len();
    let pass_rate = if initial_count > 0 {
        final_count as f64 / initial_count as f64 * 100.0
    } else {
        0.0
    };

    ScreenOutcome {
        qualifying: remaining,
        stats: ScreeningStats {
            model_name: criteria.name.clone(),
            initial_count,
            filters_applied,
            final_count,
            pass_rate,
        },
    }
}

/// Screen `universe` with every strategy in `config`, in strategy order
pub fn screen_all(
    universe: &[Fundamentals],
    config: &crate::config::ScreeningConfig,
) -> Vec<(Strategy, ScreenOutcome)> {
    Strategy::ALL
        .iter()
        .map(|strategy| {
            let outcome = screen(universe, &config.criteria(*strategy));
            info!("{}: {} qualifying stocks", strategy, outcome.stats.final_count);
            (*strategy, outcome)
        })
        .collect()
}

/// Target allocation for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub ticker: String,
    pub allocation_pct: f64,
}

/// `100 / n` percent per ticker, sorted by ticker
pub fn equal_weight(tickers: &[String]) -> Vec<Allocation> {
    if tickers.is_empty() {
        return Vec::new();
    }
    let allocation_pct = 100.0 / tickers.len() as f64;
    let mut allocations: Vec<Allocation> = tickers
        .iter()
        .map(|t| Allocation {
            ticker: t.clone(),
            allocation_pct,
        })
        .collect();
    allocations.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    allocations
}

/// Average fundamentals of a screened portfolio
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub num_stocks: usize,
    pub total_allocation: f64,
    pub avg_roe: Option<f64>,
    pub avg_ebitda_margin: Option<f64>,
    pub avg_fcf_yield: Option<f64>,
    pub avg_revenue_cagr_5y: Option<f64>,
    pub avg_debt_equity: Option<f64>,
    pub avg_forward_pe: Option<f64>,
    pub sector_distribution: BTreeMap<String, usize>,
}

impl PortfolioSummary {
    pub fn from_holdings(holdings: &[Fundamentals]) -> Self {
        let tickers: Vec<String> = holdings.iter().map(|f| f.ticker.clone()).collect();
        let total_allocation = equal_weight(&tickers).iter().map(|a| a.allocation_pct).sum();

        let mut sector_distribution = BTreeMap::new();
        for sector in holdings.iter().filter_map(|f| f.sector.as_ref()) {
            *sector_distribution.entry(sector.clone()).or_insert(0) += 1;
        }

        Self {
            num_stocks: holdings.len(),
            total_allocation,
            avg_roe: average(holdings, |f| f.roe),
            avg_ebitda_margin: average(holdings, |f| f.ebitda_margin),
            avg_fcf_yield: average(holdings, |f| f.fcf_yield),
            avg_revenue_cagr_5y: average(holdings, |f| f.revenue_cagr_5y),
            avg_debt_equity: average(holdings, |f| f.debt_equity),
            avg_forward_pe: average(holdings, |f| f.forward_pe),
            sector_distribution,
        }
    }
}

fn average(holdings: &[Fundamentals], value: Accessor) -> Option<f64> {
    let values: Vec<f64> = holdings.iter().filter_map(value).collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
