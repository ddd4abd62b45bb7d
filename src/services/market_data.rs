//! Market data source interface and an in-memory implementation.

use crate::error::{PipelineError, Result};
use crate::models::{HistoricalBar, Quote};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars between `from` and `to` (inclusive), oldest first
    async fn get_historical_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalBar>>;

    /// Live quotes for a ticker set. Tickers with no data are simply absent.
    async fn get_quotes(&self, tickers: &[String]) -> Result<Vec<Quote>>;

    /// Live quote for a single ticker
    async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        self.get_quotes(&[ticker.to_string()])
            .await?
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(ticker))
            .ok_or_else(|| PipelineError::MarketData(format!("no quote returned for {}", ticker)))
    }
}

/// Scriptable in-memory source for tests and dry runs
#[derive(Clone, Default)]
pub struct StaticMarketData {
    bars: Arc<RwLock<HashMap<String, Vec<HistoricalBar>>>>,
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
    failing: Arc<RwLock<Vec<String>>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_bars(&self, ticker: &str, mut bars: Vec<HistoricalBar>) {
        bars.sort_by_key(|b| b.date);
        self.bars.write().await.insert(ticker.to_string(), bars);
    }

    pub async fn set_quote(&self, quote: Quote) {
        self.quotes.write().await.insert(quote.symbol.clone(), quote);
    }

    pub async fn remove_quote(&self, ticker: &str) {
        self.quotes.write().await.remove(ticker);
    }

    /// Make every request for `ticker` fail with a market data error
    pub async fn fail_ticker(&self, ticker: &str) {
        self.failing.write().await.push(ticker.to_string());
    }

    async fn check_failing(&self, ticker: &str) -> Result<()> {
        if self.failing.read().await.iter().any(|t| t == ticker) {
            return Err(PipelineError::MarketData(format!(
                "simulated fetch failure for {}",
                ticker
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn get_historical_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalBar>> {
        self.check_failing(ticker).await?;
        let bars = self.bars.read().await;
        Ok(bars
            .get(ticker)
            .map(|series| {
                series
                    .iter()
                    .filter(|b| b.date >= from && b.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_quotes(&self, tickers: &[String]) -> Result<Vec<Quote>> {
        let failing = self.failing.read().await;
        let quotes = self.quotes.read().await;
        Ok(tickers
            .iter()
            .filter(|t| !failing.contains(t))
            .filter_map(|t| quotes.get(t).cloned())
            .collect())
    }
}
