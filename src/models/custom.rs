//! User-built portfolios made of individual trades

use crate::models::portfolio::PerformancePoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPortfolio {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub total_invested: f64,
    pub current_value: f64,
    pub overall_return: f64,
    pub overall_return_percent: f64,
    pub day_return: f64,
    pub day_return_percent: f64,
    pub history: Vec<PerformancePoint>,
}

impl CustomPortfolio {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner: owner.into(),
            active: true,
            created_at: Utc::now(),
            total_invested: 0.0,
            current_value: 0.0,
            overall_return: 0.0,
            overall_return_percent: 0.0,
            day_return: 0.0,
            day_return_percent: 0.0,
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub ticker: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub trade_date: NaiveDate,
    pub status: TradeStatus,
    /// For a closing sell, the buy trade it closed
    pub closing_trade_for: Option<Uuid>,
    pub realized_pnl: Option<f64>,
}

impl Trade {
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.price
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }
}
