//! Equal-weight basket backtest over a trailing period

use crate::analysis::metrics::one_year_before;
use crate::error::{PipelineError, Result};
use crate::models::{HistoricalBar, PerformancePoint};
use crate::services::market_data::MarketDataSource;
use chrono::{Months, NaiveDate};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestPeriod {
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl BacktestPeriod {
    /// Unknown period strings fall back to three months
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "6m" => BacktestPeriod::SixMonths,
            "1y" => BacktestPeriod::OneYear,
            _ => BacktestPeriod::ThreeMonths,
        }
    }

    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        let months = match self {
            BacktestPeriod::ThreeMonths => 3,
            BacktestPeriod::SixMonths => 6,
            BacktestPeriod::OneYear => 12,
        };
        today.checked_sub_months(Months::new(months)).unwrap_or(today)
    }
}

/// Average the per-ticker series, each normalised to 100 at its first close.
/// Dates where only some tickers traded average over the ones present.
pub fn combine_series(series: &[Vec<HistoricalBar>]) -> Vec<PerformancePoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for bars in series {
        let Some(first) = bars.first().map(|b| b.close).filter(|c| *c > 0.0) else {
            continue;
        };
        for bar in bars {
            let entry = by_date.entry(bar.date).or_insert((0.0, 0));
            entry.0 += bar.close / first * 100.0;
            entry.1 += 1;
        }
    }
    by_date
        .into_iter()
        .map(|(date, (sum, count))| PerformancePoint {
            date,
            portfolio_return: sum / count as f64 - 100.0,
        })
        .collect()
}

/// Backtest an equal-weight basket of `tickers` over `period` ending `today`
pub async fn backtest_basket(
    source: &dyn MarketDataSource,
    tickers: &[String],
    period: BacktestPeriod,
    today: NaiveDate,
) -> Result<Vec<PerformancePoint>> {
    let from = period.start_date(today);
    let fetches = tickers
        .iter()
        .map(|ticker| async move { (ticker, source.get_historical_bars(ticker, from, today).await) });

    let series: Vec<Vec<HistoricalBar>> = join_all(fetches)
        .await
        .into_iter()
        .filter_map(|(ticker, result)| match result {
            Ok(bars) if !bars.is_empty() => Some(bars),
            Ok(_) => None,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Backtest: no history for {}", ticker);
                None
            }
        })
        .collect();

    let points = combine_series(&series);
    if points.is_empty() {
        return Err(PipelineError::InsufficientData(
            "no historical data for any requested ticker".to_string(),
        ));
    }
    Ok(points)
}

/// One year of daily bars for the benchmark index
pub async fn benchmark_series(
    source: &dyn MarketDataSource,
    benchmark_ticker: &str,
    today: NaiveDate,
) -> Result<Vec<HistoricalBar>> {
    source
        .get_historical_bars(benchmark_ticker, one_year_before(today), today)
        .await
}
