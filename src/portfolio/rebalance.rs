//! Allocation plan for spreading a cash amount across weighted tickers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRow {
    pub ticker: String,
    /// Target weight in percent
    pub weight: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub ticker: String,
    pub weight: f64,
    pub price: f64,
    pub amount: f64,
    pub shares: f64,
    /// Cash left over after flooring to whole shares
    pub unused_cash: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    Fractional,
    Whole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalancePlan {
    pub total_amount: f64,
    pub allocations: Vec<Allocation>,
    pub total_weight: f64,
    pub unused_cash: f64,
}

impl RebalancePlan {
    /// Weights that do not add up to 100% (within a cent of a percent)
    pub fn weights_mismatch(&self) -> bool {
        (self.total_weight - 100.0).abs() > 0.01
    }
}

pub fn plan(total_amount: f64, rows: &[RebalanceRow], mode: ShareMode) -> RebalancePlan {
    let allocations: Vec<Allocation> = rows
        .iter()
        .map(|row| {
            let amount = total_amount * row.weight / 100.0;
            let raw_shares = if row.price > 0.0 { amount / row.price } else { 0.0 };
            let shares = match mode {
                ShareMode::Fractional => raw_shares,
                ShareMode::Whole => raw_shares.floor(),
            };
            let unused_cash = if row.price > 0.0 {
                amount - shares * row.price
            } else {
                amount
            };
            Allocation {
                ticker: row.ticker.clone(),
                weight: row.weight,
                price: row.price,
                amount,
                shares,
                unused_cash,
            }
        })
        .collect();

    RebalancePlan {
        total_amount,
        total_weight: rows.iter().map(|r| r.weight).sum(),
        unused_cash: allocations.iter().map(|a| a.unused_cash).sum(),
        allocations,
    }
}

/// `n` equal weights summing to 100
pub fn equal_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![100.0 / n as f64; n]
}
