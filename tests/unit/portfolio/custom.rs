//! Unit tests for custom portfolios and trades

use super::fixtures::{date, stock};
use alphadesk::db::{InMemoryStore, Store};
use alphadesk::error::PipelineError;
use alphadesk::models::{CustomPortfolio, TradeSide, TradeStatus};
use alphadesk::portfolio::custom::{revalue, CustomPortfolios};
use std::collections::HashMap;
use std::sync::Arc;

async fn setup() -> (Arc<InMemoryStore>, CustomPortfolios) {
    let store = Arc::new(InMemoryStore::new());
    store
        .upsert_stock_metrics(vec![stock("ABC.NS", 10.0, 20.0, 30.0)])
        .await
        .expect("seed");
    let service = CustomPortfolios::new(store.clone());
    (store, service)
}

#[tokio::test]
async fn test_create_requires_name() {
    let (_, service) = setup().await;
    let err = service.create("   ", "user-1").await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn test_buy_tracks_invested_amount() {
    let (store, service) = setup().await;
    let portfolio = service.create("Long term", "user-1").await.expect("create");

    let trade = service
        .buy(portfolio.id, "abc.ns", 10.0, 100.0, date(2025, 3, 3))
        .await
        .expect("buy");

    assert_eq!(trade.ticker, "ABC.NS");
    assert_eq!(trade.status, TradeStatus::Open);
    let saved = store
        .get_custom_portfolio(portfolio.id)
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(saved.total_invested, 1000.0);
}

#[tokio::test]
async fn test_buy_rejects_unknown_ticker_and_bad_quantity() {
    let (_, service) = setup().await;
    let portfolio = service.create("Long term", "user-1").await.expect("create");

    let err = service
        .buy(portfolio.id, "NOPE.NS", 1.0, 10.0, date(2025, 3, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));

    let err = service
        .buy(portfolio.id, "ABC.NS", -1.0, 10.0, date(2025, 3, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn test_exit_records_closing_trade() {
    let (store, service) = setup().await;
    let portfolio = service.create("Swing", "user-1").await.expect("create");
    let buy = service
        .buy(portfolio.id, "ABC.NS", 10.0, 100.0, date(2025, 3, 3))
        .await
        .expect("buy");

    let closed = service
        .exit(portfolio.id, buy.id, 120.0, date(2025, 3, 10))
        .await
        .expect("exit");

    assert_eq!(closed.status, TradeStatus::Closed);
    assert_eq!(closed.realized_pnl, Some(200.0));
    assert!(service.open_trades(portfolio.id).await.expect("open").is_empty());

    let trades = store.trades_for(portfolio.id).await.expect("trades");
    let sell = trades
        .iter()
        .find(|t| t.side == TradeSide::Sell)
        .expect("closing trade");
    assert_eq!(sell.closing_trade_for, Some(buy.id));

    let saved = store
        .get_custom_portfolio(portfolio.id)
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(saved.total_invested, 0.0);

    // already closed
    let err = service
        .exit(portfolio.id, buy.id, 130.0, date(2025, 3, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[tokio::test]
async fn test_revalue_marks_open_positions() {
    let (_, service) = setup().await;
    let created = service.create("Core", "user-1").await.expect("create");
    service
        .buy(created.id, "ABC.NS", 10.0, 100.0, date(2025, 3, 3))
        .await
        .expect("buy");
    let trades = service.open_trades(created.id).await.expect("open");

    let mut portfolio = CustomPortfolio::new("Core", "user-1");
    portfolio.total_invested = 1000.0;
    portfolio.current_value = 1000.0;
    let prices: HashMap<String, f64> = [("ABC.NS".to_string(), 110.0)].into_iter().collect();

    revalue(&mut portfolio, &trades, &prices, date(2025, 3, 4));

    assert_eq!(portfolio.current_value, 1100.0);
    assert_eq!(portfolio.overall_return, 100.0);
    assert!((portfolio.overall_return_percent - 10.0).abs() < 1e-9);
    assert!((portfolio.day_return_percent - 10.0).abs() < 1e-9);
    assert_eq!(portfolio.history.last().map(|p| p.date), Some(date(2025, 3, 4)));

    // no quote: falls back to the entry price
    revalue(&mut portfolio, &trades, &HashMap::new(), date(2025, 3, 5));
    assert_eq!(portfolio.current_value, 1000.0);
    assert_eq!(portfolio.overall_return, 0.0);
}
