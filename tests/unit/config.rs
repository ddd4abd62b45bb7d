//! Unit tests for configuration loading

use alphadesk::config::{parse_ticker_file, AppConfig, JobSchedules, DEFAULT_BENCHMARK};
use alphadesk::error::PipelineError;
use alphadesk::jobs::JobName;
use std::collections::HashMap;
use tokio_test::assert_err;

fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, PipelineError> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = load(&[]).expect("defaults load");
    assert_eq!(config.benchmark_ticker, DEFAULT_BENCHMARK);
    assert!(config.universe.is_empty());
    assert!(config.database_url.is_none());
    assert_eq!(config.fetch.concurrency, 8);
    assert_eq!(config.currency_symbol, "₹");
    assert!(!config.is_production());
    assert_eq!(
        config.schedules.expression(JobName::PriceAlertChecks),
        JobSchedules::default_expression(JobName::PriceAlertChecks)
    );
}

#[test]
fn test_universe_is_normalised() {
    let config = load(&[("UNIVERSE_TICKERS", " reliance.ns, TCS.NS ,,reliance.ns ")]).expect("load");
    assert_eq!(config.universe, vec!["RELIANCE.NS", "TCS.NS"]);
}

#[test]
fn test_ticker_file_comments() {
    let tickers = parse_ticker_file("# nifty\nINFY.NS\n\nhdfcbank.ns  # bank\nINFY.NS\n");
    assert_eq!(tickers, vec!["INFY.NS", "HDFCBANK.NS"]);
}

#[test]
fn test_schedule_override() {
    let config = load(&[("SCHEDULE_INTRADAY", "0 */15 * * * *")]).expect("load");
    assert_eq!(config.schedules.expression(JobName::IntradayStockUpdate), "0 */15 * * * *");
}

#[test]
fn test_invalid_cron_rejected() {
    let err = assert_err!(load(&[("SCHEDULE_ALERTS", "every five minutes")]));
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_close_before_open_rejected() {
    let err = load(&[("MARKET_OPEN", "15:00"), ("MARKET_CLOSE", "09:00")]).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_unknown_timezone_rejected() {
    let err = load(&[("MARKET_TIMEZONE", "Mars/Olympus")]).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_invalid_number_rejected() {
    let err = load(&[("FETCH_CONCURRENCY", "lots")]).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
