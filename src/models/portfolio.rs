//! Strategy model portfolios and their performance history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of portfolio construction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strategy {
    Momentum,
    Alpha,
}

impl Strategy {
    pub fn all() -> &'static [Strategy] {
        &[Strategy::Momentum, Strategy::Alpha]
    }

    /// Display label used in portfolio names
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Momentum => "Momentum Kings",
            Strategy::Alpha => "Alpha Titans",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Momentum => "Momentum",
            Strategy::Alpha => "Alpha",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "momentum" => Some(Strategy::Momentum),
            "alpha" => Some(Strategy::Alpha),
            _ => None,
        }
    }

    /// Deterministic portfolio name for a generation period, e.g.
    /// "Momentum Kings - March 2025"
    pub fn portfolio_name(&self, period: NaiveDate) -> String {
        format!("{} - {}", self.label(), period.format("%B %Y"))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selected stock with its entry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    pub ticker: String,
    pub entry_price: f64,
    /// Strategy-specific score at selection time (momentum score or alpha)
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioStatus {
    Active,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub portfolio_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPortfolio {
    pub name: String,
    pub strategy: Strategy,
    pub constituents: Vec<Constituent>,
    pub generated_at: DateTime<Utc>,
    pub status: PortfolioStatus,
    pub initial_value: f64,
    pub current_value: f64,
    pub previous_value: f64,
    pub current_return: f64,
    pub day_return: f64,
    pub peak_return: f64,
    pub max_drawdown: f64,
    pub history: Vec<PerformancePoint>,
}

impl ModelPortfolio {
    /// Fresh active portfolio worth 100 per constituent, seeded with a 0% point
    pub fn new(
        strategy: Strategy,
        constituents: Vec<Constituent>,
        generated_at: DateTime<Utc>,
        period: NaiveDate,
    ) -> Self {
        let initial_value = 100.0 * constituents.len() as f64;
        Self {
            name: strategy.portfolio_name(period),
            strategy,
            constituents,
            generated_at,
            status: PortfolioStatus::Active,
            initial_value,
            current_value: initial_value,
            previous_value: initial_value,
            current_return: 0.0,
            day_return: 0.0,
            peak_return: 0.0,
            max_drawdown: 0.0,
            history: vec![PerformancePoint {
                date: period,
                portfolio_return: 0.0,
            }],
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PortfolioStatus::Active
    }

    pub fn tickers(&self) -> Vec<String> {
        self.constituents.iter().map(|c| c.ticker.clone()).collect()
    }

    /// Write the point for `date`, replacing an existing same-day point
    pub fn record_point(&mut self, date: NaiveDate, portfolio_return: f64) {
        upsert_point(&mut self.history, date, portfolio_return);
    }
}

/// Replace the point for `date` if present, otherwise insert it keeping date order
pub fn upsert_point(history: &mut Vec<PerformancePoint>, date: NaiveDate, portfolio_return: f64) {
    match history.binary_search_by(|p| p.date.cmp(&date)) {
        Ok(idx) => history[idx].portfolio_return = portfolio_return,
        Err(idx) => history.insert(
            idx,
            PerformancePoint {
                date,
                portfolio_return,
            },
        ),
    }
}
