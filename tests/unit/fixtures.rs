//! Shared builders for unit tests

use alphadesk::common::math::{momentum_score, round2};
use alphadesk::config::AppConfig;
use alphadesk::db::Store;
use alphadesk::error::{PipelineError, Result};
use alphadesk::jobs::{FixedClock, JobContext};
use alphadesk::models::{HistoricalBar, StockMetrics};
use alphadesk::services::{MarketDataSource, NotificationSender};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid instant")
}

/// A stock that passes every momentum filter at a 100 price
pub fn stock(ticker: &str, perf_3m: f64, perf_6m: f64, perf_1y: f64) -> StockMetrics {
    let benchmark = 10.0;
    StockMetrics {
        ticker: ticker.to_string(),
        long_name: Some(format!("{} Industries", ticker)),
        last_refreshed: utc(2025, 3, 3, 12, 0),
        current_price: 100.0,
        volume: 1_000_000.0,
        market_cap: Some(1.0e10),
        perf_1d: 0.5,
        perf_1w: 1.0,
        perf_1m: 2.0,
        perf_3m,
        perf_6m,
        perf_1y,
        fifty_day_average: 90.0,
        hundred_fifty_day_average: 85.0,
        two_hundred_day_average: 80.0,
        fifty_two_week_low: 60.0,
        fifty_two_week_high: 110.0,
        avg_volume_50_day: 900_000.0,
        avg_volume_200_day: 800_000.0,
        eps_trailing_twelve_months: Some(5.0),
        trailing_pe: Some(20.0),
        benchmark_perf_1y: benchmark,
        alpha: round2(perf_1y - benchmark),
        momentum_score: round2(momentum_score(perf_3m, perf_6m, perf_1y)),
    }
}

/// Daily bars ending at `end`, one per calendar day, closes from `closes`
pub fn bars_ending(end: NaiveDate, closes: &[f64]) -> Vec<HistoricalBar> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            HistoricalBar::flat(end - Duration::days(n - 1 - i as i64), close, 1000.0)
        })
        .collect()
}

/// `count` bars rising linearly from `start` by `step`
pub fn rising_bars(end: NaiveDate, count: usize, start: f64, step: f64) -> Vec<HistoricalBar> {
    let closes: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
    bars_ending(end, &closes)
}

/// Default configuration with the given universe
pub fn config(universe: &[&str]) -> AppConfig {
    let mut config = AppConfig::from_lookup(|_| None).expect("default config");
    config.universe = universe.iter().map(|t| t.to_string()).collect();
    config
}

/// Job context over in-memory collaborators, pinned to `now`
pub fn context(
    store: Arc<dyn Store>,
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn NotificationSender>,
    universe: &[&str],
    now: DateTime<Utc>,
) -> JobContext {
    JobContext::new(&config(universe), store, source, notifier, None)
        .with_clock(Arc::new(FixedClock(now)))
}

/// Records every message it is asked to send
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every send after recording the attempt
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((channel_id.to_string(), message.to_string()));
        if self.fail {
            return Err(PipelineError::Notification("recording notifier set to fail".into()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
