//! Cheap intraday refresh from live quotes only.
//!
//! The new 1-day move is computed from the live price and previous close, and
//! the change against the stored 1-day figure is added to every longer
//! horizon. This assumes the day dropping out of each window moved like today
//! did, so the longer horizons drift until the next full daily analysis
//! replaces them.

use crate::common::math::{momentum_score, pct_change, round2};
use crate::models::{IntradayUpdate, Quote, StockMetrics};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Refresh one stored record from a live quote.
///
/// Returns `None` when the quote lacks a positive price or previous close.
pub fn refresh_from_quote(
    stored: &StockMetrics,
    quote: &Quote,
    now: DateTime<Utc>,
) -> Option<IntradayUpdate> {
    let price = quote.live_price()?;
    let previous_close = quote.live_previous_close()?;

    let perf_1d = round2(pct_change(Some(previous_close), Some(price)));
    let daily_change = perf_1d - stored.perf_1d;

    let perf_1w = round2(stored.perf_1w + daily_change);
    let perf_1m = round2(stored.perf_1m + daily_change);
    let perf_3m = round2(stored.perf_3m + daily_change);
    let perf_6m = round2(stored.perf_6m + daily_change);
    let perf_1y = round2(stored.perf_1y + daily_change);

    Some(IntradayUpdate {
        ticker: stored.ticker.clone(),
        current_price: round2(price),
        perf_1d,
        perf_1w,
        perf_1m,
        perf_3m,
        perf_6m,
        perf_1y,
        momentum_score: round2(momentum_score(perf_3m, perf_6m, perf_1y)),
        alpha: round2(perf_1y - stored.benchmark_perf_1y),
        refreshed_at: now,
    })
}

/// Refresh a whole stored universe; tickers without a usable quote are left out
pub fn refresh_all(
    stored: &[StockMetrics],
    quotes: &[Quote],
    now: DateTime<Utc>,
) -> Vec<IntradayUpdate> {
    let by_symbol: HashMap<&str, &Quote> = quotes.iter().map(|q| (q.symbol.as_str(), q)).collect();
    stored
        .iter()
        .filter_map(|stock| {
            by_symbol
                .get(stock.ticker.as_str())
                .and_then(|quote| refresh_from_quote(stock, quote, now))
        })
        .collect()
}
