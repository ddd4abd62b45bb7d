//! In-process store backed by `tokio::sync::RwLock` maps

use crate::db::store::Store;
use crate::error::Result;
use crate::models::{
    CustomPortfolio, IntradayUpdate, ModelPortfolio, PriceAlert, StockMetrics, Trade,
};
use crate::portfolio::lifecycle::PortfolioRotation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    stocks: Arc<RwLock<HashMap<String, StockMetrics>>>,
    portfolios: Arc<RwLock<HashMap<String, ModelPortfolio>>>,
    alerts: Arc<RwLock<HashMap<Uuid, PriceAlert>>>,
    custom: Arc<RwLock<HashMap<Uuid, CustomPortfolio>>>,
    trades: Arc<RwLock<HashMap<Uuid, Trade>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_stock_metrics(&self, records: Vec<StockMetrics>) -> Result<usize> {
        let mut stocks = self.stocks.write().await;
        let count = records.len();
        for record in records {
            stocks.insert(record.ticker.clone(), record);
        }
        Ok(count)
    }

    async fn list_stock_metrics(&self) -> Result<Vec<StockMetrics>> {
        let stocks = self.stocks.read().await;
        let mut all: Vec<StockMetrics> = stocks.values().cloned().collect();
        all.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(all)
    }

    async fn get_stock_metrics(&self, ticker: &str) -> Result<Option<StockMetrics>> {
        Ok(self.stocks.read().await.get(ticker).cloned())
    }

    async fn apply_intraday_updates(&self, updates: &[IntradayUpdate]) -> Result<usize> {
        let mut stocks = self.stocks.write().await;
        let mut touched = 0;
        for update in updates {
            if let Some(stock) = stocks.get_mut(&update.ticker) {
                update.apply_to(stock);
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn list_portfolios(&self) -> Result<Vec<ModelPortfolio>> {
        let portfolios = self.portfolios.read().await;
        let mut all: Vec<ModelPortfolio> = portfolios.values().cloned().collect();
        all.sort_by(|a, b| a.generated_at.cmp(&b.generated_at).then(a.name.cmp(&b.name)));
        Ok(all)
    }

    async fn get_portfolio(&self, name: &str) -> Result<Option<ModelPortfolio>> {
        Ok(self.portfolios.read().await.get(name).cloned())
    }

    async fn save_portfolio(&self, portfolio: &ModelPortfolio) -> Result<()> {
        self.portfolios
            .write()
            .await
            .insert(portfolio.name.clone(), portfolio.clone());
        Ok(())
    }

    async fn apply_rotation(&self, rotation: &PortfolioRotation) -> Result<()> {
        let mut portfolios = self.portfolios.write().await;
        rotation.apply_to(&mut portfolios);
        Ok(())
    }

    async fn create_alert(&self, alert: PriceAlert) -> Result<()> {
        self.alerts.write().await.insert(alert.id, alert);
        Ok(())
    }

    async fn list_alerts(&self) -> Result<Vec<PriceAlert>> {
        let alerts = self.alerts.read().await;
        let mut all: Vec<PriceAlert> = alerts.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    async fn active_alerts(&self) -> Result<Vec<PriceAlert>> {
        Ok(self
            .list_alerts()
            .await?
            .into_iter()
            .filter(|a| a.active)
            .collect())
    }

    async fn deactivate_alert(&self, id: Uuid, triggered_at: DateTime<Utc>) -> Result<bool> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&id) {
            Some(alert) if alert.active => {
                alert.active = false;
                alert.triggered_at = Some(triggered_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save_custom_portfolio(&self, portfolio: &CustomPortfolio) -> Result<()> {
        self.custom
            .write()
            .await
            .insert(portfolio.id, portfolio.clone());
        Ok(())
    }

    async fn get_custom_portfolio(&self, id: Uuid) -> Result<Option<CustomPortfolio>> {
        Ok(self.custom.read().await.get(&id).cloned())
    }

    async fn list_custom_portfolios(&self) -> Result<Vec<CustomPortfolio>> {
        let custom = self.custom.read().await;
        let mut all: Vec<CustomPortfolio> = custom.values().cloned().collect();
        all.sort_by_key(|p| p.created_at);
        Ok(all)
    }

    async fn save_trade(&self, trade: &Trade) -> Result<()> {
        self.trades.write().await.insert(trade.id, trade.clone());
        Ok(())
    }

    async fn trades_for(&self, portfolio_id: Uuid) -> Result<Vec<Trade>> {
        let trades = self.trades.read().await;
        let mut matching: Vec<Trade> = trades
            .values()
            .filter(|t| t.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.trade_date);
        Ok(matching)
    }
}
