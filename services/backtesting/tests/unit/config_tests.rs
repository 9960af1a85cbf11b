//! Unit tests for configuration loading, validation and error classification

use crate::test_utils::*;
use assert_matches::assert_matches;
use equity_backtest::config::{AppConfig, BacktestConfig, DEFAULT_BENCHMARK};
use equity_backtest::error::{BacktestError, ErrorKind, RunWarning};
use equity_backtest::schedule::RebalanceFrequency;
use equity_backtest::screening::Strategy;
use rstest::*;
use std::io::Write;

#[rstest]
fn test_default_config() {
    let config = BacktestConfig::default();
    assert_eq!(config.start_date, date(2020, 1, 1));
    assert_eq!(config.end_date, date(2024, 12, 31));
    assert_eq!(config.initial_capital, 10_000.0);
    assert_eq!(config.rebalance_frequency, RebalanceFrequency::Annual);
    assert_eq!(config.risk_free_rate, 0.02);
    assert_eq!(config.periods_per_year, 252);
    assert_eq!(config.benchmark_symbol, DEFAULT_BENCHMARK);
    assert!(config.validate().is_ok());
}

#[rstest]
#[case::reversed_dates(BacktestConfig { start_date: date(2025, 1, 1), ..TestConfigFactory::basic_config() })]
#[case::zero_capital(BacktestConfig { initial_capital: 0.0, ..TestConfigFactory::basic_config() })]
#[case::negative_capital(BacktestConfig { initial_capital: -1.0, ..TestConfigFactory::basic_config() })]
#[case::no_periods(BacktestConfig { periods_per_year: 0, ..TestConfigFactory::basic_config() })]
#[case::nan_rate(BacktestConfig { risk_free_rate: f64::NAN, ..TestConfigFactory::basic_config() })]
fn test_invalid_configs(#[case] config: BacktestConfig) {
    let err = config.validate().unwrap_err();
    assert_matches!(err, BacktestError::Configuration { .. });
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[rstest]
fn test_frequency_token_override() {
    let config = TestConfigFactory::basic_config()
        .with_frequency_token("Monthly")
        .unwrap();
    assert_eq!(config.rebalance_frequency, RebalanceFrequency::Monthly);

    let err = TestConfigFactory::basic_config()
        .with_frequency_token("biweekly")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[rstest]
fn test_partial_json_uses_defaults() {
    let config = AppConfig::from_json(
        r#"{
            "backtest": {
                "start_date": "2021-01-01",
                "rebalance_frequency": "monthly",
                "benchmark_symbol": "SPY"
            },
            "screening": {
                "strategies": {
                    "moderate": { "name": "Loose", "roe_min": 10.0 }
                }
            }
        }"#,
    )
    .unwrap();

    assert_eq!(config.backtest.start_date, date(2021, 1, 1));
    assert_eq!(config.backtest.end_date, date(2024, 12, 31));
    assert_eq!(config.backtest.rebalance_frequency, RebalanceFrequency::Monthly);
    assert_eq!(config.backtest.benchmark_symbol, "SPY");

    let moderate = config.screening.criteria(Strategy::Moderate);
    assert_eq!(moderate.name, "Loose");
    assert_eq!(moderate.roe_min, Some(10.0));
    assert_eq!(moderate.fcf_yield_min, None);
    // Strategies not listed fall back to their defaults
    assert_eq!(
        config.screening.criteria(Strategy::Valuation),
        Strategy::Valuation.default_criteria()
    );
}

#[rstest]
fn test_json_with_unknown_frequency_rejected() {
    let err = AppConfig::from_json(r#"{ "backtest": { "rebalance_frequency": "weekly" } }"#)
        .unwrap_err();
    assert_matches!(err, BacktestError::Json(_));
}

#[rstest]
fn test_json_with_invalid_values_rejected() {
    let err = AppConfig::from_json(r#"{ "backtest": { "initial_capital": -5.0 } }"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[rstest]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "backtest": {{ "initial_capital": 25000.0 }} }}"#).unwrap();
    file.flush().unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.backtest.initial_capital, 25_000.0);
}

#[rstest]
fn test_load_missing_file_is_io_error() {
    let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
    assert_matches!(err, BacktestError::Io(_));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[rstest]
fn test_error_kinds() {
    assert_eq!(BacktestError::no_data("x").kind(), ErrorKind::DataUnavailable);
    assert_eq!(BacktestError::config("x").kind(), ErrorKind::Configuration);
    assert_eq!(
        BacktestError::InvalidFrequency("x".to_string()).kind(),
        ErrorKind::Configuration
    );
    assert!(BacktestError::no_data("nothing here").to_string().contains("nothing here"));
}

#[rstest]
fn test_warning_display() {
    let warning = RunWarning::SymbolsDropped {
        symbols: symbols(&["AAA", "BBB"]),
    };
    assert_eq!(warning.to_string(), "no price data for AAA, BBB");
    let warning = RunWarning::BenchmarkUnavailable {
        symbol: "SPX".to_string(),
    };
    assert!(warning.to_string().contains("SPX"));
}
