//! Unit tests for rebalance schedule generation

use crate::test_utils::*;
use assert_matches::assert_matches;
use equity_backtest::error::BacktestError;
use equity_backtest::schedule::{RebalanceFrequency, RebalanceSchedule};
use rstest::*;

#[rstest]
#[case("annual", RebalanceFrequency::Annual)]
#[case("monthly", RebalanceFrequency::Monthly)]
#[case("Annual", RebalanceFrequency::Annual)]
#[case(" MONTHLY ", RebalanceFrequency::Monthly)]
fn test_frequency_tokens(#[case] token: &str, #[case] expected: RebalanceFrequency) {
    assert_eq!(token.parse::<RebalanceFrequency>().unwrap(), expected);
}

#[rstest]
#[case("weekly")]
#[case("quarterly")]
#[case("")]
fn test_unknown_frequency_rejected(#[case] token: &str) {
    let err = token.parse::<RebalanceFrequency>().unwrap_err();
    assert_matches!(err, BacktestError::InvalidFrequency(ref t) if t == token);
}

#[rstest]
fn test_frequency_display_round_trips() {
    for frequency in [RebalanceFrequency::Annual, RebalanceFrequency::Monthly] {
        assert_eq!(frequency.to_string().parse::<RebalanceFrequency>().unwrap(), frequency);
    }
    assert_eq!(RebalanceFrequency::default(), RebalanceFrequency::Annual);
}

#[rstest]
fn test_annual_schedule_year_ends() {
    let schedule =
        RebalanceSchedule::generate(date(2020, 1, 1), date(2024, 12, 31), RebalanceFrequency::Annual);
    assert_eq!(
        schedule.dates(),
        &[
            date(2020, 12, 31),
            date(2021, 12, 31),
            date(2022, 12, 31),
            date(2023, 12, 31),
            date(2024, 12, 31),
        ]
    );
    assert_eq!(schedule.frequency(), RebalanceFrequency::Annual);
}

#[rstest]
fn test_annual_schedule_excludes_year_end_after_range() {
    let schedule =
        RebalanceSchedule::generate(date(2020, 3, 1), date(2022, 6, 30), RebalanceFrequency::Annual);
    assert_eq!(schedule.dates(), &[date(2020, 12, 31), date(2021, 12, 31)]);
}

#[rstest]
fn test_monthly_schedule_month_ends() {
    let schedule =
        RebalanceSchedule::generate(date(2023, 11, 15), date(2024, 3, 31), RebalanceFrequency::Monthly);
    assert_eq!(
        schedule.dates(),
        &[
            date(2023, 11, 30),
            date(2023, 12, 31),
            date(2024, 1, 31),
            date(2024, 2, 29),
            date(2024, 3, 31),
        ]
    );
}

#[rstest]
fn test_short_range_has_no_dates() {
    let schedule =
        RebalanceSchedule::generate(date(2024, 3, 1), date(2024, 3, 30), RebalanceFrequency::Monthly);
    assert!(schedule.is_empty());
    assert_eq!(schedule.len(), 0);
}

#[rstest]
fn test_single_day_range_on_period_end() {
    let day = date(2024, 12, 31);
    let annual = RebalanceSchedule::generate(day, day, RebalanceFrequency::Annual);
    assert_eq!(annual.dates(), &[day]);
    let monthly = RebalanceSchedule::generate(day, day, RebalanceFrequency::Monthly);
    assert_eq!(monthly.dates(), &[day]);
}

#[rstest]
fn test_contains_is_exact() {
    let schedule =
        RebalanceSchedule::generate(date(2024, 1, 1), date(2024, 12, 31), RebalanceFrequency::Monthly);
    assert!(schedule.contains(date(2024, 3, 31)));
    assert!(!schedule.contains(date(2024, 3, 29)));
    assert!(!schedule.contains(date(2024, 4, 1)));
}

#[rstest]
fn test_from_token() {
    let schedule = RebalanceSchedule::from_token(date(2024, 1, 1), date(2024, 12, 31), "monthly").unwrap();
    assert_eq!(schedule.len(), 12);

    let err = RebalanceSchedule::from_token(date(2024, 1, 1), date(2024, 12, 31), "daily").unwrap_err();
    assert_matches!(err, BacktestError::InvalidFrequency(_));
}
