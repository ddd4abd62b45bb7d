//! Read accessors for the surrounding application

use crate::db::Store;
use crate::error::Result;
use crate::models::{ModelPortfolio, PriceAlert, StockMetrics, Strategy};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SEARCH_MIN_LEN: usize = 2;
pub const SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct Queries {
    store: Arc<dyn Store>,
}

impl Queries {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn stock(&self, ticker: &str) -> Result<Option<StockMetrics>> {
        self.store
            .get_stock_metrics(&ticker.trim().to_uppercase())
            .await
    }

    /// Whole universe, momentum score descending
    pub async fn momentum_ranking(&self) -> Result<Vec<StockMetrics>> {
        let mut stocks = self.store.list_stock_metrics().await?;
        stocks.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));
        Ok(stocks)
    }

    /// Stocks with positive alpha, alpha descending
    pub async fn alpha_ranking(&self) -> Result<Vec<StockMetrics>> {
        let mut stocks: Vec<StockMetrics> = self
            .store
            .list_stock_metrics()
            .await?
            .into_iter()
            .filter(|s| s.alpha > 0.0)
            .collect();
        stocks.sort_by(|a, b| b.alpha.total_cmp(&a.alpha));
        Ok(stocks)
    }

    /// Case-insensitive substring match on ticker or name
    pub async fn search(&self, query: &str) -> Result<Vec<StockMetrics>> {
        let needle = query.trim().to_lowercase();
        if needle.chars().count() < SEARCH_MIN_LEN {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .list_stock_metrics()
            .await?
            .into_iter()
            .filter(|s| {
                s.ticker.to_lowercase().contains(&needle)
                    || s
                        .long_name
                        .as_deref()
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .take(SEARCH_LIMIT)
            .collect())
    }

    pub async fn active_portfolios(&self) -> Result<Vec<ModelPortfolio>> {
        Ok(self
            .store
            .list_portfolios()
            .await?
            .into_iter()
            .filter(|p| p.is_active())
            .collect())
    }

    pub async fn active_portfolio(&self, strategy: Strategy) -> Result<Option<ModelPortfolio>> {
        Ok(self
            .active_portfolios()
            .await?
            .into_iter()
            .find(|p| p.strategy == strategy))
    }

    /// Every portfolio ever generated, grouped by strategy, newest first
    pub async fn portfolio_history(&self) -> Result<BTreeMap<Strategy, Vec<ModelPortfolio>>> {
        let mut grouped: BTreeMap<Strategy, Vec<ModelPortfolio>> = BTreeMap::new();
        for portfolio in self.store.list_portfolios().await? {
            grouped.entry(portfolio.strategy).or_default().push(portfolio);
        }
        for portfolios in grouped.values_mut() {
            portfolios.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        }
        Ok(grouped)
    }

    pub async fn active_alerts_for(&self, user_id: &str) -> Result<Vec<PriceAlert>> {
        Ok(self
            .store
            .active_alerts()
            .await?
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect())
    }
}
