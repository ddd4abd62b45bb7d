//! Per-ticker computed metrics

use crate::common::math::{momentum_score, round2};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full metrics record for one ticker, upserted by ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetrics {
    pub ticker: String,
    pub long_name: Option<String>,
    pub last_refreshed: DateTime<Utc>,
    pub current_price: f64,
    pub volume: f64,
    pub market_cap: Option<f64>,

    pub perf_1d: f64,
    pub perf_1w: f64,
    pub perf_1m: f64,
    pub perf_3m: f64,
    pub perf_6m: f64,
    pub perf_1y: f64,

    pub fifty_day_average: f64,
    pub hundred_fifty_day_average: f64,
    pub two_hundred_day_average: f64,
    pub fifty_two_week_low: f64,
    pub fifty_two_week_high: f64,
    pub avg_volume_50_day: f64,
    pub avg_volume_200_day: f64,

    pub eps_trailing_twelve_months: Option<f64>,
    pub trailing_pe: Option<f64>,

    /// Benchmark 1-year return the alpha was measured against
    pub benchmark_perf_1y: f64,
    pub alpha: f64,
    pub momentum_score: f64,
}

impl StockMetrics {
    /// Recompute the momentum score from the stored performance fields
    pub fn recomputed_momentum(&self) -> f64 {
        round2(momentum_score(self.perf_3m, self.perf_6m, self.perf_1y))
    }

    /// Recompute alpha from the stored 1Y performance and benchmark return
    pub fn recomputed_alpha(&self) -> f64 {
        round2(self.perf_1y - self.benchmark_perf_1y)
    }

    pub fn has_positive_fundamentals(&self) -> bool {
        matches!(
            (self.eps_trailing_twelve_months, self.trailing_pe),
            (Some(eps), Some(pe)) if eps > 0.0 && pe > 0.0
        )
    }
}

/// Partial update written by the intraday refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayUpdate {
    pub ticker: String,
    pub current_price: f64,
    pub perf_1d: f64,
    pub perf_1w: f64,
    pub perf_1m: f64,
    pub perf_3m: f64,
    pub perf_6m: f64,
    pub perf_1y: f64,
    pub momentum_score: f64,
    pub alpha: f64,
    pub refreshed_at: DateTime<Utc>,
}

impl IntradayUpdate {
    pub fn apply_to(&self, stock: &mut StockMetrics) {
        stock.current_price = self.current_price;
        stock.perf_1d = self.perf_1d;
        stock.perf_1w = self.perf_1w;
        stock.perf_1m = self.perf_1m;
        stock.perf_3m = self.perf_3m;
        stock.perf_6m = self.perf_6m;
        stock.perf_1y = self.perf_1y;
        stock.momentum_score = self.momentum_score;
        stock.alpha = self.alpha;
        stock.last_refreshed = self.refreshed_at;
    }
}
