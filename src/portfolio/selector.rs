//! Rule-based constituent selection for the strategy portfolios

use crate::common::math::percentile;
use crate::models::{Constituent, ModelPortfolio, StockMetrics, Strategy};
use crate::services::market_data::MarketDataSource;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

pub const MAX_CONSTITUENTS: usize = 10;

/// Quantile of 6M performance a momentum candidate must reach
pub const RELATIVE_STRENGTH_QUANTILE: f64 = 0.75;

/// Minimum price as a fraction of the 52-week high
pub const NEAR_HIGH_RATIO: f64 = 0.75;

/// Calendar days of history used to look up an entry price
const ENTRY_LOOKBACK_DAYS: i64 = 5;

/// 75th-percentile 6M performance across the universe
pub fn relative_strength_threshold(stocks: &[StockMetrics]) -> Option<f64> {
    let perf_6m: Vec<f64> = stocks.iter().map(|s| s.perf_6m).collect();
    percentile(&perf_6m, RELATIVE_STRENGTH_QUANTILE)
}

pub fn is_momentum_candidate(stock: &StockMetrics, rs_threshold: f64) -> bool {
    stock.momentum_score > 0.0
        && stock.current_price > stock.fifty_day_average
        && stock.current_price > stock.two_hundred_day_average
        && stock.hundred_fifty_day_average > stock.two_hundred_day_average
        && stock.current_price >= stock.fifty_two_week_high * NEAR_HIGH_RATIO
        && stock.perf_6m >= rs_threshold
}

pub fn is_alpha_candidate(stock: &StockMetrics) -> bool {
    stock.alpha > 0.0 && stock.has_positive_fundamentals()
}

fn by_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Top momentum stocks, momentum score descending
pub fn select_momentum(stocks: &[StockMetrics]) -> Vec<&StockMetrics> {
    let Some(threshold) = relative_strength_threshold(stocks) else {
        return Vec::new();
    };
    let mut candidates: Vec<&StockMetrics> = stocks
        .iter()
        .filter(|s| is_momentum_candidate(s, threshold))
        .collect();
    candidates.sort_by(|a, b| by_desc(a.momentum_score, b.momentum_score).then(a.ticker.cmp(&b.ticker)));
    candidates.truncate(MAX_CONSTITUENTS);
    candidates
}

/// Top alpha stocks, alpha descending
pub fn select_alpha(stocks: &[StockMetrics]) -> Vec<&StockMetrics> {
    let mut candidates: Vec<&StockMetrics> = stocks.iter().filter(|s| is_alpha_candidate(s)).collect();
    candidates.sort_by(|a, b| by_desc(a.alpha, b.alpha).then(a.ticker.cmp(&b.ticker)));
    candidates.truncate(MAX_CONSTITUENTS);
    candidates
}

pub fn select(strategy: Strategy, stocks: &[StockMetrics]) -> Vec<&StockMetrics> {
    match strategy {
        Strategy::Momentum => select_momentum(stocks),
        Strategy::Alpha => select_alpha(stocks),
    }
}

fn strategy_score(strategy: Strategy, stock: &StockMetrics) -> f64 {
    match strategy {
        Strategy::Momentum => stock.momentum_score,
        Strategy::Alpha => stock.alpha,
    }
}

/// Builds the next generation of model portfolios from the stored universe
pub struct PortfolioSelector {
    source: Arc<dyn MarketDataSource>,
    concurrency: usize,
}

impl PortfolioSelector {
    pub fn new(source: Arc<dyn MarketDataSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Close from a few days back so a new portfolio does not start flat:
    /// the second-to-last bar of the last few days, falling back to the
    /// current price when history is unavailable.
    pub async fn entry_price(&self, stock: &StockMetrics, today: NaiveDate) -> f64 {
        let from = today - Duration::days(ENTRY_LOOKBACK_DAYS);
        match self.source.get_historical_bars(&stock.ticker, from, today).await {
            Ok(bars) if bars.len() > 1 => bars[bars.len() - 2].close,
            Ok(_) => stock.current_price,
            Err(e) => {
                debug!(ticker = %stock.ticker, error = %e, "Entry price lookup failed, using current price");
                stock.current_price
            }
        }
    }

    async fn constituents(
        &self,
        strategy: Strategy,
        picks: &[&StockMetrics],
        today: NaiveDate,
    ) -> Vec<Constituent> {
        let lookups: Vec<_> = picks
            .iter()
            .map(|&stock| async move {
                Constituent {
                    ticker: stock.ticker.clone(),
                    entry_price: self.entry_price(stock, today).await,
                    score: strategy_score(strategy, stock),
                }
            })
            .collect();
        // buffered keeps the ranking order
        stream::iter(lookups)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// One portfolio per strategy that has at least one qualifying stock
    pub async fn build(
        &self,
        stocks: &[StockMetrics],
        generated_at: DateTime<Utc>,
        period: NaiveDate,
    ) -> Vec<ModelPortfolio> {
        let mut portfolios = Vec::new();
        for &strategy in Strategy::all() {
            let picks = select(strategy, stocks);
            if picks.is_empty() {
                info!(strategy = %strategy, "No qualifying stocks for {} portfolio", strategy);
                continue;
            }
            let constituents = self.constituents(strategy, &picks, period).await;
            let portfolio = ModelPortfolio::new(strategy, constituents, generated_at, period);
            info!(
                strategy = %strategy,
                name = %portfolio.name,
                constituents = portfolio.constituents.len(),
                "Built portfolio '{}'",
                portfolio.name
            );
            portfolios.push(portfolio);
        }
        portfolios
    }
}
