//! Unit tests for the basket backtest

use super::fixtures::{bars_ending, date};
use alphadesk::error::PipelineError;
use alphadesk::models::HistoricalBar;
use alphadesk::portfolio::backtest::{backtest_basket, combine_series, BacktestPeriod};
use alphadesk::services::StaticMarketData;

#[test]
fn test_period_parse_defaults_to_three_months() {
    assert_eq!(BacktestPeriod::parse("6m"), BacktestPeriod::SixMonths);
    assert_eq!(BacktestPeriod::parse(" 1Y "), BacktestPeriod::OneYear);
    assert_eq!(BacktestPeriod::parse("3m"), BacktestPeriod::ThreeMonths);
    assert_eq!(BacktestPeriod::parse("forever"), BacktestPeriod::ThreeMonths);
}

#[test]
fn test_period_start_date() {
    let today = date(2025, 5, 31);
    assert_eq!(BacktestPeriod::ThreeMonths.start_date(today), date(2025, 2, 28));
    assert_eq!(BacktestPeriod::OneYear.start_date(today), date(2024, 5, 31));
}

#[test]
fn test_combine_series_averages_normalised_closes() {
    let end = date(2025, 3, 3);
    let a = bars_ending(end, &[100.0, 110.0]);
    let b = bars_ending(end, &[50.0, 60.0]);

    let points = combine_series(&[a, b]);

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].portfolio_return, 0.0);
    assert!((points[1].portfolio_return - 15.0).abs() < 1e-9);
}

#[test]
fn test_combine_series_late_listing() {
    let end = date(2025, 3, 3);
    let a = bars_ending(end, &[100.0, 110.0]);
    let late = vec![HistoricalBar::flat(end, 40.0, 10.0)];

    let points = combine_series(&[a, late]);

    // the late series starts at its own 100 baseline
    assert!((points[1].portfolio_return - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_backtest_skips_failed_tickers() {
    let today = date(2025, 3, 3);
    let source = StaticMarketData::new();
    source.set_bars("AAA.NS", bars_ending(today, &[100.0, 120.0])).await;
    source.fail_ticker("BAD.NS").await;

    let tickers = vec!["AAA.NS".to_string(), "BAD.NS".to_string()];
    let points = backtest_basket(&source, &tickers, BacktestPeriod::ThreeMonths, today)
        .await
        .expect("backtest");

    assert_eq!(points.len(), 2);
    assert!((points[1].portfolio_return - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_backtest_without_any_history_fails() {
    let source = StaticMarketData::new();
    let tickers = vec!["NONE.NS".to_string()];

    let err = backtest_basket(&source, &tickers, BacktestPeriod::OneYear, date(2025, 3, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData(_)));
}
