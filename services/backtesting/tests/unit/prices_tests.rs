//! Unit tests for price series, alignment and the in-memory source

use crate::test_utils::*;
use assert_matches::assert_matches;
use equity_backtest::error::{BacktestError, ErrorKind};
use equity_backtest::prices::{InMemoryPriceSource, PriceSeries, PriceSource, PriceTable};
use rstest::*;
use std::io::Write;

#[rstest]
fn test_series_rejects_unsorted_dates() {
    let err = PriceSeries::new(
        "AAA",
        vec![(date(2024, 1, 3), Some(1.0)), (date(2024, 1, 2), Some(1.0))],
    )
    .unwrap_err();
    assert_matches!(err, BacktestError::InvalidPriceData { ref symbol, .. } if symbol == "AAA");
}

#[rstest]
fn test_series_rejects_duplicate_dates() {
    let day = date(2024, 1, 2);
    let result = PriceSeries::new("AAA", vec![(day, Some(1.0)), (day, Some(2.0))]);
    assert!(result.is_err());
}

#[rstest]
fn test_series_window_and_fill() {
    let series = PriceSeries::new(
        "AAA",
        vec![
            (date(2024, 1, 1), Some(9.0)),
            (date(2024, 1, 2), None),
            (date(2024, 1, 3), Some(11.0)),
            (date(2024, 1, 4), None),
        ],
    )
    .unwrap();

    let window = series.window(date(2024, 1, 2), date(2024, 1, 4));
    assert_eq!(window.len(), 3);
    let filled = window.filled();
    let values: Vec<Option<f64>> = filled.points().iter().map(|(_, p)| *p).collect();
    assert_eq!(values, vec![Some(11.0), Some(11.0), Some(11.0)]);
    assert_eq!(series.value_at(date(2024, 1, 3)), Some(11.0));
    assert_eq!(series.value_at(date(2024, 1, 2)), None);
}

#[rstest]
fn test_align_unions_dates_and_fills() {
    let a = TestDataFactory::closes("AAA", &[date(2024, 1, 2), date(2024, 1, 4)], &[10.0, 12.0]);
    let b = TestDataFactory::closes("BBB", &[date(2024, 1, 3), date(2024, 1, 4)], &[20.0, 21.0]);

    let table = PriceTable::align(&[a, b], date(2024, 1, 1), date(2024, 1, 31));

    assert_eq!(table.dates(), &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);
    assert_eq!(table.column("AAA").unwrap(), &[Some(10.0), Some(10.0), Some(12.0)]);
    // Leading gap is back-filled from the first observation
    assert_eq!(table.column("BBB").unwrap(), &[Some(20.0), Some(20.0), Some(21.0)]);
}

#[rstest]
fn test_align_drops_symbols_without_observations() {
    let days = TestDataFactory::weekdays(date(2024, 1, 1), date(2024, 1, 12));
    let live = TestDataFactory::flat("LIVE", &days, 5.0);
    let dead = PriceSeries::new("DEAD", days.iter().map(|d| (*d, None)).collect()).unwrap();

    let table = PriceTable::align(&[live, dead], date(2024, 1, 1), date(2024, 1, 12));
    assert_eq!(table.symbols(), &["LIVE".to_string()]);
    assert!(!table.has_data("DEAD"));
    assert!(table.has_data("LIVE"));
}

#[rstest]
fn test_align_respects_date_range() {
    let days = TestDataFactory::weekdays(date(2024, 1, 1), date(2024, 2, 29));
    let series = TestDataFactory::flat("AAA", &days, 5.0);
    let table = PriceTable::align(&[series], date(2024, 2, 1), date(2024, 2, 29));
    assert_eq!(table.dates().first(), Some(&date(2024, 2, 1)));
    assert_eq!(table.dates().last(), Some(&date(2024, 2, 29)));
    assert_eq!(table.len(), 21);
}

#[rstest]
fn test_from_columns_validates_lengths() {
    let dates = vec![date(2024, 1, 2), date(2024, 1, 3)];
    let err = PriceTable::from_columns(dates.clone(), vec![("AAA".to_string(), vec![Some(1.0)])])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let table =
        PriceTable::from_columns(dates, vec![("AAA".to_string(), vec![Some(1.0), None])]).unwrap();
    // No filling on pre-aligned columns
    assert_eq!(table.price("AAA", 1), None);
    assert_eq!(table.price("AAA", 0), Some(1.0));
    assert_eq!(table.price("ZZZ", 0), None);
}

#[rstest]
fn test_from_columns_rejects_unsorted_dates() {
    let result = PriceTable::from_columns(vec![date(2024, 1, 3), date(2024, 1, 2)], Vec::new());
    assert!(result.is_err());
}

#[rstest]
fn test_source_fetch_unknown_symbols_is_data_unavailable() {
    let source = InMemoryPriceSource::new();
    let err = source
        .fetch(&symbols(&["NOPE"]), date(2024, 1, 1), date(2024, 12, 31))
        .unwrap_err();
    assert_matches!(err, BacktestError::DataUnavailable { .. });
}

#[rstest]
fn test_source_fetch_partial_symbols() {
    let days = TestDataFactory::weekdays(date(2024, 1, 1), date(2024, 1, 31));
    let source = TestDataFactory::source(vec![TestDataFactory::flat("AAA", &days, 10.0)]);
    let table = source
        .fetch(&symbols(&["AAA", "MISSING"]), date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    assert_eq!(table.symbols(), &["AAA".to_string()]);
    assert_eq!(table.len(), days.len());
}

#[rstest]
fn test_source_fetch_series_windows_and_fills() {
    let source = TestDataFactory::source(vec![
        PriceSeries::new(
            "SPX",
            vec![
                (date(2023, 12, 29), Some(100.0)),
                (date(2024, 1, 2), None),
                (date(2024, 1, 3), Some(102.0)),
            ],
        )
        .unwrap(),
    ]);

    let series = source
        .fetch_series("SPX", date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    let values: Vec<Option<f64>> = series.points().iter().map(|(_, p)| *p).collect();
    assert_eq!(values, vec![Some(102.0), Some(102.0)]);

    assert!(source.fetch_series("SPX", date(2025, 1, 1), date(2025, 12, 31)).is_none());
    assert!(source.fetch_series("NONE", date(2024, 1, 1), date(2024, 12, 31)).is_none());
}

#[rstest]
fn test_csv_loading_with_gaps() {
    let csv = "date,AAA,BBB\n2024-01-02,10.0,\n2024-01-03,10.5,20.0\n2024-01-04,,21.0\n";
    let source = InMemoryPriceSource::from_csv_reader(csv.as_bytes()).unwrap();
    assert_eq!(source.symbols(), symbols(&["AAA", "BBB"]));

    let table = source
        .fetch(&symbols(&["AAA", "BBB"]), date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    assert_eq!(table.column("AAA").unwrap(), &[Some(10.0), Some(10.5), Some(10.5)]);
    assert_eq!(table.column("BBB").unwrap(), &[Some(20.0), Some(20.0), Some(21.0)]);
}

#[rstest]
fn test_csv_bad_number_is_input_error() {
    let csv = "date,AAA\n2024-01-02,ten\n";
    let err = InMemoryPriceSource::from_csv_reader(csv.as_bytes()).unwrap_err();
    assert_matches!(err, BacktestError::InvalidPriceData { ref symbol, .. } if symbol == "AAA");
}

#[rstest]
fn test_csv_bad_date_is_input_error() {
    let csv = "date,AAA\n01/02/2024,10\n";
    let err = InMemoryPriceSource::from_csv_reader(csv.as_bytes()).unwrap_err();
    assert_matches!(err, BacktestError::DateParse(_));
}

#[rstest]
fn test_csv_without_symbols_rejected() {
    let err = InMemoryPriceSource::from_csv_reader("date\n2024-01-02\n".as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
}

#[rstest]
fn test_csv_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,AAA").unwrap();
    writeln!(file, "2024-01-03,11").unwrap();
    writeln!(file, "2024-01-02,10").unwrap();
    file.flush().unwrap();

    let source = InMemoryPriceSource::from_csv_path(file.path()).unwrap();
    let series = source
        .fetch_series("AAA", date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    // Rows are sorted by date on load
    assert_eq!(series.points()[0], (date(2024, 1, 2), Some(10.0)));
}
