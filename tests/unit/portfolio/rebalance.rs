//! Unit tests for the rebalance planner

use alphadesk::portfolio::rebalance::{equal_weights, plan, RebalanceRow, ShareMode};

fn rows() -> Vec<RebalanceRow> {
    vec![
        RebalanceRow {
            ticker: "AAA.NS".to_string(),
            weight: 60.0,
            price: 100.0,
        },
        RebalanceRow {
            ticker: "BBB.NS".to_string(),
            weight: 40.0,
            price: 300.0,
        },
    ]
}

#[test]
fn test_whole_shares_leave_unused_cash() {
    let plan = plan(10_000.0, &rows(), ShareMode::Whole);

    assert_eq!(plan.allocations[0].shares, 60.0);
    assert_eq!(plan.allocations[0].unused_cash, 0.0);
    assert_eq!(plan.allocations[1].shares, 13.0);
    assert!((plan.allocations[1].unused_cash - 100.0).abs() < 1e-9);
    assert!((plan.unused_cash - 100.0).abs() < 1e-9);
    assert!(!plan.weights_mismatch());
}

#[test]
fn test_fractional_shares_use_everything() {
    let plan = plan(10_000.0, &rows(), ShareMode::Fractional);

    assert!((plan.allocations[1].shares - 4000.0 / 300.0).abs() < 1e-9);
    assert!(plan.unused_cash.abs() < 1e-9);
}

#[test]
fn test_zero_price_keeps_amount_unused() {
    let mut rows = rows();
    rows[1].price = 0.0;
    let plan = plan(10_000.0, &rows, ShareMode::Whole);

    assert_eq!(plan.allocations[1].shares, 0.0);
    assert_eq!(plan.allocations[1].unused_cash, 4000.0);
}

#[test]
fn test_weights_mismatch_flagged() {
    let mut rows = rows();
    rows[0].weight = 50.0;
    assert!(plan(1000.0, &rows, ShareMode::Whole).weights_mismatch());
}

#[test]
fn test_equal_weights() {
    let weights = equal_weights(3);
    assert_eq!(weights.len(), 3);
    assert!((weights.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    assert!(equal_weights(0).is_empty());
}
