//! Price alert evaluation with at-most-once delivery
//!
//! A crossed alert is first deactivated through the store's compare-and-set
//! and only the caller that wins the flip sends the notification. A failed
//! send is logged and not retried, so an alert can be lost but never
//! delivered twice.

use crate::db::Store;
use crate::error::Result;
use crate::models::PriceAlert;
use crate::services::market_data::MarketDataSource;
use crate::services::notification::NotificationSender;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Alerts whose condition is met at the given prices. Alerts for tickers
/// without a price are left out.
pub fn crossed<'a>(alerts: &'a [PriceAlert], prices: &HashMap<String, f64>) -> Vec<(&'a PriceAlert, f64)> {
    alerts
        .iter()
        .filter(|a| a.active)
        .filter_map(|a| prices.get(&a.ticker).map(|&p| (a, p)))
        .filter(|(a, price)| a.condition.is_met(*price, a.target_price))
        .collect()
}

/// Markdown message sent when an alert fires
pub fn render_message(alert: &PriceAlert, price: f64, currency: &str) -> String {
    format!(
        "📈 **Price Alert!**\n\n`{}` has crossed your target.\n\n*Target:* {} {}{}\n*Current Price:* {}{:.2}",
        alert.ticker, alert.condition, currency, alert.target_price, currency, price
    )
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlertRun {
    pub checked: usize,
    pub fired: usize,
    pub missing_quotes: usize,
    pub failed_sends: usize,
}

pub struct AlertEvaluator {
    store: Arc<dyn Store>,
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn NotificationSender>,
    currency: String,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn Store>,
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn NotificationSender>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            source,
            notifier,
            currency: currency.into(),
        }
    }

    /// Check every active alert against live quotes
    pub async fn evaluate(&self, now: DateTime<Utc>) -> Result<AlertRun> {
        let alerts = self.store.active_alerts().await?;
        if alerts.is_empty() {
            debug!("No active alerts to check");
            return Ok(AlertRun::default());
        }

        let tickers: Vec<String> = alerts
            .iter()
            .map(|a| a.ticker.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let quotes = self.source.get_quotes(&tickers).await?;
        let prices: HashMap<String, f64> = quotes
            .iter()
            .filter_map(|q| q.live_price().map(|p| (q.symbol.clone(), p)))
            .collect();

        let mut run = AlertRun {
            checked: alerts.len(),
            missing_quotes: alerts.iter().filter(|a| !prices.contains_key(&a.ticker)).count(),
            ..Default::default()
        };

        for (alert, price) in crossed(&alerts, &prices) {
            if !self.store.deactivate_alert(alert.id, now).await? {
                debug!(alert_id = %alert.id, "Alert already fired elsewhere, skipping");
                continue;
            }
            run.fired += 1;

            let message = render_message(alert, price, &self.currency);
            match self.notifier.send(&alert.channel_id, &message).await {
                Ok(()) => info!(
                    alert_id = %alert.id,
                    ticker = %alert.ticker,
                    user = %alert.user_id,
                    price = price,
                    "Alert triggered for {} (user {})",
                    alert.ticker,
                    alert.user_id
                ),
                Err(e) => {
                    run.failed_sends += 1;
                    error!(
                        alert_id = %alert.id,
                        ticker = %alert.ticker,
                        notifier = self.notifier.name(),
                        error = %e,
                        "Alert fired but notification failed"
                    );
                }
            }
        }

        if run.missing_quotes > 0 {
            warn!(count = run.missing_quotes, "Alerts skipped this cycle: no live quote");
        }
        Ok(run)
    }
}
