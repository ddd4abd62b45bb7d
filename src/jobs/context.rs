//! Job context for dependency injection

use crate::analysis::session::MarketSession;
use crate::config::AppConfig;
use crate::db::Store;
use crate::metrics::Metrics;
use crate::services::market_data::MarketDataSource;
use crate::services::notification::NotificationSender;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock used by jobs; tests pin it to fixed instants
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Everything a job handler reads or writes.
///
/// Metrics are optional so handlers can run in tests without a registry.
pub struct JobContext {
    pub store: Arc<dyn Store>,
    pub market_data: Arc<dyn MarketDataSource>,
    pub notifier: Arc<dyn NotificationSender>,
    pub metrics: Option<Arc<Metrics>>,
    pub clock: Arc<dyn Clock>,
    pub universe: Vec<String>,
    pub benchmark_ticker: String,
    pub session: MarketSession,
    pub concurrency: usize,
    pub currency_symbol: String,
}

impl JobContext {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        market_data: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn NotificationSender>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            store,
            market_data,
            notifier,
            metrics,
            clock: Arc::new(SystemClock),
            universe: config.universe.clone(),
            benchmark_ticker: config.benchmark_ticker.clone(),
            session: config.session.clone(),
            concurrency: config.fetch.concurrency,
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
