//! Daily mark-to-market of model portfolios

use crate::models::ModelPortfolio;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Equal-weight portfolio value at the given prices.
///
/// A constituent with no live price, or with a non-positive entry price,
/// contributes its weight unchanged.
pub fn portfolio_value(portfolio: &ModelPortfolio, prices: &HashMap<String, f64>) -> f64 {
    if portfolio.constituents.is_empty() {
        return portfolio.initial_value;
    }
    let weight = portfolio.initial_value / portfolio.constituents.len() as f64;
    portfolio
        .constituents
        .iter()
        .map(|c| {
            let live = prices
                .get(&c.ticker)
                .copied()
                .filter(|p| p.is_finite() && *p > 0.0);
            match live {
                Some(price) if c.entry_price > 0.0 && c.entry_price.is_finite() => {
                    weight * (price / c.entry_price)
                }
                _ => weight,
            }
        })
        .sum()
}

fn pct(delta: f64, base: f64) -> f64 {
    if base > 0.0 && base.is_finite() {
        delta / base * 100.0
    } else {
        0.0
    }
}

/// Re-mark one portfolio and write today's history point.
///
/// Peak return only rises and max drawdown only falls. Running twice on the
/// same date replaces that date's point and measures the day return from the
/// same prior-day value.
pub fn update_performance(
    portfolio: &mut ModelPortfolio,
    prices: &HashMap<String, f64>,
    date: NaiveDate,
) {
    let rerun = portfolio.history.last().is_some_and(|p| p.date == date);
    let previous_value = if rerun {
        portfolio.previous_value
    } else {
        portfolio.current_value
    };
    let new_value = portfolio_value(portfolio, prices);

    let day_return = pct(new_value - previous_value, previous_value);
    let overall_return = pct(new_value - portfolio.initial_value, portfolio.initial_value);
    let peak_return = portfolio.peak_return.max(overall_return);
    let peak_value = portfolio.initial_value * (1.0 + peak_return / 100.0);
    let drawdown = if peak_value > 0.0 {
        (new_value / peak_value - 1.0) * 100.0
    } else {
        0.0
    };

    portfolio.previous_value = previous_value;
    portfolio.current_value = new_value;
    portfolio.day_return = day_return;
    portfolio.current_return = overall_return;
    portfolio.peak_return = peak_return;
    portfolio.max_drawdown = portfolio.max_drawdown.min(drawdown);
    portfolio.record_point(date, overall_return);
}
