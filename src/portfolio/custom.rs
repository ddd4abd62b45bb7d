//! User-built portfolios: buy/exit trades and daily valuation

use crate::db::Store;
use crate::error::{PipelineError, Result};
use crate::models::portfolio::upsert_point;
use crate::models::{CustomPortfolio, Trade, TradeSide, TradeStatus};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Mark a custom portfolio to market.
///
/// Each open trade is worth quantity x live price, falling back to its entry
/// price when no quote is available. Percentages are 0 on a zero base.
pub fn revalue(
    portfolio: &mut CustomPortfolio,
    open_trades: &[Trade],
    prices: &HashMap<String, f64>,
    date: NaiveDate,
) {
    let value: f64 = open_trades
        .iter()
        .filter(|t| t.is_open() && t.side == TradeSide::Buy)
        .map(|t| {
            let price = prices
                .get(&t.ticker)
                .copied()
                .filter(|p| p.is_finite() && *p > 0.0)
                .unwrap_or(t.price);
            t.quantity * price
        })
        .sum();

    let previous = portfolio.current_value;
    portfolio.overall_return = value - portfolio.total_invested;
    portfolio.overall_return_percent = if portfolio.total_invested > 0.0 {
        portfolio.overall_return / portfolio.total_invested * 100.0
    } else {
        0.0
    };
    portfolio.day_return = value - previous;
    portfolio.day_return_percent = if previous > 0.0 {
        portfolio.day_return / previous * 100.0
    } else {
        0.0
    };
    portfolio.current_value = value;
    upsert_point(&mut portfolio.history, date, portfolio.overall_return_percent);
}

/// Trade operations over the record store
pub struct CustomPortfolios {
    store: Arc<dyn Store>,
}

impl CustomPortfolios {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, name: &str, owner: &str) -> Result<CustomPortfolio> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::InvalidInput("portfolio name is required".into()));
        }
        let portfolio = CustomPortfolio::new(name, owner);
        self.store.save_custom_portfolio(&portfolio).await?;
        Ok(portfolio)
    }

    async fn load(&self, portfolio_id: Uuid) -> Result<CustomPortfolio> {
        self.store
            .get_custom_portfolio(portfolio_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("portfolio {}", portfolio_id)))
    }

    /// Open a position. The ticker must exist in the metrics universe.
    pub async fn buy(
        &self,
        portfolio_id: Uuid,
        ticker: &str,
        quantity: f64,
        price: f64,
        trade_date: NaiveDate,
    ) -> Result<Trade> {
        if quantity.is_nan() || price.is_nan() || quantity <= 0.0 || price <= 0.0 {
            return Err(PipelineError::InvalidInput(
                "quantity and price must be positive".into(),
            ));
        }
        let mut portfolio = self.load(portfolio_id).await?;
        let ticker = ticker.trim().to_uppercase();
        if self.store.get_stock_metrics(&ticker).await?.is_none() {
            return Err(PipelineError::NotFound(format!(
                "stock ticker {} not found",
                ticker
            )));
        }

        let trade = Trade {
            id: Uuid::new_v4(),
            portfolio_id,
            ticker,
            side: TradeSide::Buy,
            quantity,
            price,
            trade_date,
            status: TradeStatus::Open,
            closing_trade_for: None,
            realized_pnl: None,
        };
        self.store.save_trade(&trade).await?;

        portfolio.total_invested += trade.cost_basis();
        self.store.save_custom_portfolio(&portfolio).await?;
        info!(portfolio = %portfolio_id, ticker = %trade.ticker, quantity = quantity, "Opened trade");
        Ok(trade)
    }

    /// Close an open buy trade at `exit_price`; returns the closed buy trade
    pub async fn exit(
        &self,
        portfolio_id: Uuid,
        trade_id: Uuid,
        exit_price: f64,
        exit_date: NaiveDate,
    ) -> Result<Trade> {
        if exit_price.is_nan() || exit_price <= 0.0 {
            return Err(PipelineError::InvalidInput("exit price must be positive".into()));
        }
        let mut trade = self
            .store
            .trades_for(portfolio_id)
            .await?
            .into_iter()
            .find(|t| t.id == trade_id && t.is_open() && t.side == TradeSide::Buy)
            .ok_or_else(|| PipelineError::NotFound(format!("open trade {}", trade_id)))?;

        let pnl = (exit_price - trade.price) * trade.quantity;
        trade.status = TradeStatus::Closed;
        trade.realized_pnl = Some(pnl);
        self.store.save_trade(&trade).await?;

        let closing = Trade {
            id: Uuid::new_v4(),
            portfolio_id,
            ticker: trade.ticker.clone(),
            side: TradeSide::Sell,
            quantity: trade.quantity,
            price: exit_price,
            trade_date: exit_date,
            status: TradeStatus::Closed,
            closing_trade_for: Some(trade.id),
            realized_pnl: Some(pnl),
        };
        self.store.save_trade(&closing).await?;

        if let Some(mut portfolio) = self.store.get_custom_portfolio(portfolio_id).await? {
            portfolio.total_invested -= trade.cost_basis();
            self.store.save_custom_portfolio(&portfolio).await?;
        }
        info!(portfolio = %portfolio_id, ticker = %trade.ticker, pnl = pnl, "Closed trade");
        Ok(trade)
    }

    pub async fn open_trades(&self, portfolio_id: Uuid) -> Result<Vec<Trade>> {
        Ok(self
            .store
            .trades_for(portfolio_id)
            .await?
            .into_iter()
            .filter(|t| t.is_open())
            .collect())
    }
}
