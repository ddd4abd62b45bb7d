//! Unit tests for price alert evaluation

use super::fixtures::{utc, RecordingNotifier};
use alphadesk::alerts::evaluator::{crossed, render_message};
use alphadesk::alerts::AlertEvaluator;
use alphadesk::db::{InMemoryStore, Store};
use alphadesk::models::{AlertCondition, PriceAlert, Quote};
use alphadesk::services::StaticMarketData;
use std::collections::HashMap;
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryStore>,
    source: StaticMarketData,
    notifier: RecordingNotifier,
}

impl Harness {
    fn new(notifier: RecordingNotifier) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            source: StaticMarketData::new(),
            notifier,
        }
    }

    fn evaluator(&self) -> AlertEvaluator {
        AlertEvaluator::new(
            self.store.clone(),
            Arc::new(self.source.clone()),
            Arc::new(self.notifier.clone()),
            "₹",
        )
    }
}

#[test]
fn test_conditions_are_strict() {
    assert!(AlertCondition::Above.is_met(501.0, 500.0));
    assert!(!AlertCondition::Above.is_met(500.0, 500.0));
    assert!(AlertCondition::Below.is_met(489.0, 490.0));
    assert!(!AlertCondition::Below.is_met(490.0, 490.0));
}

#[test]
fn test_crossed_ignores_unpriced_and_inactive() {
    let hit = PriceAlert::new("u1", "abc.ns", 100.0, AlertCondition::Above, "c1");
    let mut inactive = PriceAlert::new("u1", "ABC.NS", 100.0, AlertCondition::Above, "c1");
    inactive.active = false;
    let unpriced = PriceAlert::new("u1", "XYZ.NS", 1.0, AlertCondition::Above, "c1");
    let alerts = vec![hit, inactive, unpriced];
    let prices: HashMap<String, f64> = [("ABC.NS".to_string(), 120.0)].into_iter().collect();

    let fired = crossed(&alerts, &prices);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0.ticker, "ABC.NS");
    assert_eq!(fired[0].1, 120.0);
}

#[test]
fn test_message_format() {
    let alert = PriceAlert::new("u1", "TCS.NS", 4000.0, AlertCondition::Above, "c1");
    let message = render_message(&alert, 4012.5, "₹");
    assert!(message.contains("`TCS.NS` has crossed your target."));
    assert!(message.contains("*Target:* above ₹4000"));
    assert!(message.contains("*Current Price:* ₹4012.50"));
}

#[tokio::test]
async fn test_alert_fires_once() {
    let h = Harness::new(RecordingNotifier::new());
    let alert = PriceAlert::new("u1", "ABC.NS", 500.0, AlertCondition::Below, "chat-1");
    let id = alert.id;
    h.store.create_alert(alert).await.expect("create");
    let evaluator = h.evaluator();

    h.source.set_quote(Quote::new("ABC.NS", 520.0)).await;
    let run = evaluator.evaluate(utc(2025, 3, 3, 5, 0)).await.expect("first");
    assert_eq!(run.checked, 1);
    assert_eq!(run.fired, 0);

    h.source.set_quote(Quote::new("ABC.NS", 495.0)).await;
    let run = evaluator.evaluate(utc(2025, 3, 3, 5, 5)).await.expect("second");
    assert_eq!(run.fired, 1);

    h.source.set_quote(Quote::new("ABC.NS", 490.0)).await;
    let run = evaluator.evaluate(utc(2025, 3, 3, 5, 10)).await.expect("third");
    assert_eq!(run.checked, 0);
    assert_eq!(run.fired, 0);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "chat-1");
    assert!(sent[0].1.contains("*Current Price:* ₹495.00"));

    let stored = h.store.list_alerts().await.expect("alerts");
    let stored = stored.iter().find(|a| a.id == id).expect("alert");
    assert!(!stored.active);
    assert_eq!(stored.triggered_at, Some(utc(2025, 3, 3, 5, 5)));
}

#[tokio::test]
async fn test_concurrent_evaluations_deliver_once() {
    let h = Harness::new(RecordingNotifier::new());
    h.store
        .create_alert(PriceAlert::new("u1", "ABC.NS", 100.0, AlertCondition::Above, "chat-1"))
        .await
        .expect("create");
    h.source.set_quote(Quote::new("ABC.NS", 150.0)).await;

    let (a, b) = (h.evaluator(), h.evaluator());
    let now = utc(2025, 3, 3, 5, 0);
    let (ra, rb) = tokio::join!(a.evaluate(now), b.evaluate(now));

    assert_eq!(ra.expect("a").fired + rb.expect("b").fired, 1);
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn test_failed_send_is_not_retried() {
    let h = Harness::new(RecordingNotifier::failing());
    h.store
        .create_alert(PriceAlert::new("u1", "ABC.NS", 100.0, AlertCondition::Above, "chat-1"))
        .await
        .expect("create");
    h.source.set_quote(Quote::new("ABC.NS", 150.0)).await;
    let evaluator = h.evaluator();

    let run = evaluator.evaluate(utc(2025, 3, 3, 5, 0)).await.expect("run");
    assert_eq!(run.fired, 1);
    assert_eq!(run.failed_sends, 1);

    let run = evaluator.evaluate(utc(2025, 3, 3, 5, 5)).await.expect("rerun");
    assert_eq!(run.fired, 0);
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn test_missing_quote_leaves_alert_active() {
    let h = Harness::new(RecordingNotifier::new());
    h.store
        .create_alert(PriceAlert::new("u1", "ABC.NS", 100.0, AlertCondition::Above, "chat-1"))
        .await
        .expect("create");

    let run = h.evaluator().evaluate(utc(2025, 3, 3, 5, 0)).await.expect("run");

    assert_eq!(run.missing_quotes, 1);
    assert_eq!(h.store.active_alerts().await.expect("active").len(), 1);
}
