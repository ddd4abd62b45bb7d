//! Full per-stock metrics computation from one year of daily bars and a live quote

use crate::common::math::{momentum_score, pct_change, round2, trailing_mean};
use crate::error::{PipelineError, Result};
use crate::models::{HistoricalBar, Quote, StockMetrics};
use crate::services::market_data::MarketDataSource;
use chrono::{DateTime, Months, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trading-day offsets for the fixed lookback horizons
pub const OFFSET_1W: usize = 5;
pub const OFFSET_1M: usize = 21;
pub const OFFSET_3M: usize = 63;
pub const OFFSET_6M: usize = 126;

/// Minimum bars needed to produce a record
pub const MIN_BARS: usize = 2;

/// Close of the bar `offset` positions from the end (`bars[len - offset]`)
fn close_back(bars: &[HistoricalBar], offset: usize) -> Option<f64> {
    bars.len()
        .checked_sub(offset)
        .and_then(|idx| bars.get(idx))
        .map(|b| b.close)
}

/// 1-year return over a bar series: first close to last close
pub fn one_year_return(bars: &[HistoricalBar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if bars.len() >= MIN_BARS => {
            pct_change(Some(first.close), Some(last.close))
        }
        _ => 0.0,
    }
}

/// Build the stored metrics record for one ticker.
///
/// Performance fields are rounded first; the momentum score is then derived
/// from the rounded values so a reader can recompute it exactly.
pub fn compute_stock_metrics(
    ticker: &str,
    bars: &[HistoricalBar],
    quote: &Quote,
    benchmark_perf_1y: f64,
    now: DateTime<Utc>,
) -> Result<StockMetrics> {
    if bars.len() < MIN_BARS {
        return Err(PipelineError::InsufficientData(format!(
            "{} has {} bars, need at least {}",
            ticker,
            bars.len(),
            MIN_BARS
        )));
    }
    let price = quote.live_price().ok_or_else(|| {
        PipelineError::InsufficientData(format!("{} quote has no usable price", ticker))
    })?;

    let perf_1d = match quote.live_previous_close() {
        Some(prev) => pct_change(Some(prev), Some(price)),
        None => quote
            .change_percent
            .filter(|p| p.is_finite())
            .unwrap_or(0.0),
    };
    let perf_1d = round2(perf_1d);
    let perf_1w = round2(pct_change(close_back(bars, OFFSET_1W), Some(price)));
    let perf_1m = round2(pct_change(close_back(bars, OFFSET_1M), Some(price)));
    let perf_3m = round2(pct_change(close_back(bars, OFFSET_3M), Some(price)));
    let perf_6m = round2(pct_change(close_back(bars, OFFSET_6M), Some(price)));
    let perf_1y = round2(pct_change(bars.first().map(|b| b.close), Some(price)));

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let fifty_day_average = quote
        .fifty_day_average
        .or_else(|| trailing_mean(&closes, 50))
        .unwrap_or(price);
    let two_hundred_day_average = trailing_mean(&closes, 200)
        .or(quote.two_hundred_day_average)
        .unwrap_or(price);
    let hundred_fifty_day_average = trailing_mean(&closes, 150).unwrap_or(price);

    let fifty_two_week_high = quote.fifty_two_week_high.unwrap_or_else(|| {
        bars.iter().map(|b| b.high).fold(f64::MIN, f64::max).max(price)
    });
    let fifty_two_week_low = quote.fifty_two_week_low.unwrap_or_else(|| {
        bars.iter().map(|b| b.low).fold(f64::MAX, f64::min).min(price)
    });

    let avg_volume_50_day = quote
        .average_volume_3_month
        .or_else(|| trailing_mean(&volumes, 50))
        .unwrap_or(0.0);
    let avg_volume_200_day = trailing_mean(&volumes, 200).unwrap_or(0.0);

    let benchmark_perf_1y = round2(benchmark_perf_1y);

    Ok(StockMetrics {
        ticker: ticker.to_string(),
        long_name: quote.long_name.clone(),
        last_refreshed: now,
        current_price: round2(price),
        volume: quote.volume.unwrap_or(0.0),
        market_cap: quote.market_cap.map(round2),
        perf_1d,
        perf_1w,
        perf_1m,
        perf_3m,
        perf_6m,
        perf_1y,
        fifty_day_average: round2(fifty_day_average),
        hundred_fifty_day_average: round2(hundred_fifty_day_average),
        two_hundred_day_average: round2(two_hundred_day_average),
        fifty_two_week_low: round2(fifty_two_week_low),
        fifty_two_week_high: round2(fifty_two_week_high),
        avg_volume_50_day: avg_volume_50_day.round(),
        avg_volume_200_day: avg_volume_200_day.round(),
        eps_trailing_twelve_months: quote.eps_trailing_twelve_months,
        trailing_pe: quote.trailing_pe,
        benchmark_perf_1y,
        alpha: round2(perf_1y - benchmark_perf_1y),
        momentum_score: round2(momentum_score(perf_3m, perf_6m, perf_1y)),
    })
}

/// Result of a full-universe run: computed records plus the tickers that were skipped
#[derive(Debug, Default)]
pub struct MetricsRun {
    pub records: Vec<StockMetrics>,
    pub failures: Vec<(String, PipelineError)>,
    pub benchmark_perf_1y: f64,
}

/// Fetches bars and quotes for a universe and computes every record,
/// isolating failures per ticker
pub struct MetricsComputer {
    source: Arc<dyn MarketDataSource>,
    benchmark_ticker: String,
    concurrency: usize,
}

impl MetricsComputer {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        benchmark_ticker: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            benchmark_ticker: benchmark_ticker.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Benchmark 1-year return; a fetch failure yields 0 so the run continues
    pub async fn benchmark_return(&self, today: NaiveDate) -> f64 {
        let from = one_year_before(today);
        match self
            .source
            .get_historical_bars(&self.benchmark_ticker, from, today)
            .await
        {
            Ok(bars) if bars.len() >= MIN_BARS => one_year_return(&bars),
            Ok(bars) => {
                warn!(
                    benchmark = %self.benchmark_ticker,
                    count = bars.len(),
                    "Benchmark history too short, using 0% market return"
                );
                0.0
            }
            Err(e) => {
                warn!(
                    benchmark = %self.benchmark_ticker,
                    error = %e,
                    "Failed to fetch benchmark history, using 0% market return"
                );
                0.0
            }
        }
    }

    async fn compute_one(
        &self,
        ticker: &str,
        today: NaiveDate,
        benchmark_perf_1y: f64,
        now: DateTime<Utc>,
    ) -> Result<StockMetrics> {
        let from = one_year_before(today);
        let (bars, quote) = tokio::try_join!(
            self.source.get_historical_bars(ticker, from, today),
            self.source.get_quote(ticker),
        )?;
        compute_stock_metrics(ticker, &bars, &quote, benchmark_perf_1y, now)
    }

    /// Compute metrics for every ticker with bounded concurrency.
    /// One ticker's failure never cancels the others.
    pub async fn compute_universe(&self, universe: &[String], now: DateTime<Utc>, today: NaiveDate) -> MetricsRun {
        let benchmark_perf_1y = self.benchmark_return(today).await;
        info!(
            tickers = universe.len(),
            benchmark_perf_1y = benchmark_perf_1y,
            concurrency = self.concurrency,
            "Computing metrics for {} tickers",
            universe.len()
        );

        let fetches: Vec<_> = universe
            .iter()
            .map(|ticker| async move {
                let result = self.compute_one(ticker, today, benchmark_perf_1y, now).await;
                (ticker.clone(), result)
            })
            .collect();
        let outcomes: Vec<(String, Result<StockMetrics>)> = stream::iter(fetches)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut run = MetricsRun {
            benchmark_perf_1y,
            ..Default::default()
        };
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(record) => {
                    debug!(ticker = %ticker, momentum = record.momentum_score, "Computed metrics for {}", ticker);
                    run.records.push(record);
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Skipping {}: {}", ticker, e);
                    run.failures.push((ticker, e));
                }
            }
        }
        run.records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        run
    }
}

pub fn one_year_before(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(12)).unwrap_or(today)
}
