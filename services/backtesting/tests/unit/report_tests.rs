//! Unit tests for report rendering

use crate::test_utils::*;
use equity_backtest::engine::BacktestEngine;
use equity_backtest::report::{COLUMNS, ComparisonRow, ComparisonTable, PerformanceSummary, ScreeningReport};
use equity_backtest::screening::{Strategy, equal_weight, screen};
use rstest::*;

fn sample_result() -> equity_backtest::engine::BacktestResult {
    let dates = TestDataFactory::weekdays(date(2024, 1, 1), date(2024, 12, 31));
    let source = TestDataFactory::source(vec![
        TestDataFactory::geometric("AAA", &dates, 100.0, 0.001),
        TestDataFactory::geometric("BBB", &dates, 50.0, -0.0005),
        TestDataFactory::geometric("SPX", &dates, 4_000.0, 0.0004),
    ]);
    BacktestEngine::new(TestConfigFactory::basic_config())
        .run("Model 1 (Strict Quality)", &symbols(&["AAA", "BBB"]), &source)
        .unwrap()
}

#[rstest]
fn test_row_precision() {
    let result = sample_result();
    let row = ComparisonRow::new(&result.name, &result.metrics);
    let m = &result.metrics;

    assert_eq!(row.stocks, 2);
    assert_eq!(row.cumulative_return, format!("{:.1}%", m.cumulative_return));
    assert_eq!(row.excess_return, format!("{:.1}%", m.excess_return));
    assert_eq!(row.max_drawdown, format!("{:.1}%", m.max_drawdown));
    assert_eq!(row.volatility, format!("{:.1}%", m.volatility));
    assert_eq!(row.sharpe_ratio, format!("{:.2}", m.sharpe_ratio));
    assert_eq!(row.sortino_ratio, format!("{:.2}", m.sortino_ratio));
    assert_eq!(row.beta, format!("{:.2}", m.beta));
    assert_eq!(row.alpha, format!("{:.2}", m.jensens_alpha));
    assert_eq!(row.information_ratio, format!("{:.2}", m.information_ratio));
}

#[rstest]
fn test_table_renders_aligned_rows() {
    let result = sample_result();
    let table = ComparisonTable::from_results(std::slice::from_ref(&result));
    let rendered = table.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    for column in COLUMNS {
        assert!(lines[0].contains(column), "missing column {column}");
    }
    assert!(lines[1].chars().all(|c| c == '-' || c == ' '));
    assert!(lines[2].starts_with("Model 1 (Strict Quality)"));
    assert_eq!(lines[0].len(), lines[2].len());
    assert!(table.row("Model 1 (Strict Quality)").is_some());
    assert!(table.row("Model 9").is_none());
}

#[rstest]
fn test_performance_summary_mentions_key_figures() {
    let result = sample_result();
    let text = PerformanceSummary::new(&result).to_string();
    assert!(text.starts_with("Model 1 (Strict Quality)"));
    assert!(text.contains(&format!("{:.2}%", result.metrics.cumulative_return)));
    assert!(text.contains("annual rebalancing"));
    assert!(text.contains("Rebalances:"));
}

#[rstest]
fn test_screening_report() {
    let outcome = screen(&TestDataFactory::universe(), &Strategy::StrictQuality.default_criteria());
    let allocations = equal_weight(&outcome.tickers());
    let text = ScreeningReport::new(&outcome, &allocations).to_string();

    assert!(text.starts_with("Model 1 (Strict Quality)"));
    assert!(text.contains("ROE >= 20.0%"));
    assert!(text.contains("Qualifying: 2 (40.0% pass rate)"));
    assert!(text.contains("AAA"));
    assert!(text.contains("50.00%"));
}
