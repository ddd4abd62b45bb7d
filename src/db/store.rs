//! Abstract record store used by every job

use crate::error::Result;
use crate::models::{
    CustomPortfolio, IntradayUpdate, ModelPortfolio, PriceAlert, StockMetrics, Trade,
};
use crate::portfolio::lifecycle::PortfolioRotation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
    /// Bulk upsert keyed by ticker; returns the number of records written
    async fn upsert_stock_metrics(&self, records: Vec<StockMetrics>) -> Result<usize>;
    async fn list_stock_metrics(&self) -> Result<Vec<StockMetrics>>;
    async fn get_stock_metrics(&self, ticker: &str) -> Result<Option<StockMetrics>>;
    /// Partial intraday write; unknown tickers are ignored. Returns rows touched.
    async fn apply_intraday_updates(&self, updates: &[IntradayUpdate]) -> Result<usize>;

    async fn list_portfolios(&self) -> Result<Vec<ModelPortfolio>>;
    async fn get_portfolio(&self, name: &str) -> Result<Option<ModelPortfolio>>;
    /// Persist the performance fields and history of an existing portfolio
    async fn save_portfolio(&self, portfolio: &ModelPortfolio) -> Result<()>;
    /// Supersede and activate portfolios in one atomic step
    async fn apply_rotation(&self, rotation: &PortfolioRotation) -> Result<()>;

    async fn create_alert(&self, alert: PriceAlert) -> Result<()>;
    async fn list_alerts(&self) -> Result<Vec<PriceAlert>>;
    async fn active_alerts(&self) -> Result<Vec<PriceAlert>>;
    /// Compare-and-set `active: true -> false`. Returns false when the alert
    /// was already inactive (or missing), so only one caller ever wins.
    async fn deactivate_alert(&self, id: Uuid, triggered_at: DateTime<Utc>) -> Result<bool>;

    async fn save_custom_portfolio(&self, portfolio: &CustomPortfolio) -> Result<()>;
    async fn get_custom_portfolio(&self, id: Uuid) -> Result<Option<CustomPortfolio>>;
    async fn list_custom_portfolios(&self) -> Result<Vec<CustomPortfolio>>;
    async fn save_trade(&self, trade: &Trade) -> Result<()>;
    async fn trades_for(&self, portfolio_id: Uuid) -> Result<Vec<Trade>>;
}
