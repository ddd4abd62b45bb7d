//! Unit tests for portfolio rotation

use super::fixtures::{date, utc};
use alphadesk::error::PipelineError;
use alphadesk::models::{Constituent, ModelPortfolio, PortfolioStatus, Strategy};
use alphadesk::portfolio::lifecycle::{check_single_active, PortfolioRotation};
use std::collections::HashMap;

fn portfolio(strategy: Strategy, month: u32) -> ModelPortfolio {
    let constituents = vec![Constituent {
        ticker: "AAA.NS".to_string(),
        entry_price: 100.0,
        score: 1.0,
    }];
    ModelPortfolio::new(strategy, constituents, utc(2025, month, 1, 0, 0), date(2025, month, 1))
}

fn keyed(portfolios: &[ModelPortfolio]) -> HashMap<String, ModelPortfolio> {
    portfolios.iter().map(|p| (p.name.clone(), p.clone())).collect()
}

#[test]
fn test_rotation_supersedes_previous_generation() {
    let existing = vec![portfolio(Strategy::Momentum, 2), portfolio(Strategy::Alpha, 2)];
    let incoming = vec![portfolio(Strategy::Momentum, 3), portfolio(Strategy::Alpha, 3)];

    let rotation = PortfolioRotation::plan(&existing, incoming);
    assert_eq!(rotation.superseded.len(), 2);
    rotation.verify().expect("valid rotation");

    let mut store = keyed(&existing);
    rotation.apply_to(&mut store);

    assert_eq!(store.len(), 4);
    assert_eq!(
        store["Momentum Kings - February 2025"].status,
        PortfolioStatus::Superseded
    );
    assert!(store["Alpha Titans - March 2025"].is_active());
    check_single_active(store.values()).expect("one active per strategy");
}

#[test]
fn test_partial_generation_still_supersedes_all() {
    let existing = vec![portfolio(Strategy::Momentum, 2), portfolio(Strategy::Alpha, 2)];
    let rotation = PortfolioRotation::plan(&existing, vec![portfolio(Strategy::Momentum, 3)]);

    let mut store = keyed(&existing);
    rotation.apply_to(&mut store);

    let active: Vec<&ModelPortfolio> = store.values().filter(|p| p.is_active()).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Momentum Kings - March 2025");
}

#[test]
fn test_empty_generation_supersedes_active() {
    let existing = vec![portfolio(Strategy::Momentum, 2), portfolio(Strategy::Alpha, 2)];
    let rotation = PortfolioRotation::plan(&existing, Vec::new());
    assert!(!rotation.is_noop());
    assert_eq!(rotation.superseded.len(), 2);

    let mut store = keyed(&existing);
    rotation.apply_to(&mut store);
    assert_eq!(store.len(), 2);
    assert!(store.values().all(|p| !p.is_active()));
}

#[test]
fn test_nothing_active_and_nothing_incoming_is_noop() {
    let mut retired = portfolio(Strategy::Momentum, 1);
    retired.status = PortfolioStatus::Superseded;
    let rotation = PortfolioRotation::plan(&[retired], Vec::new());
    assert!(rotation.is_noop());
}

#[test]
fn test_same_period_rerun_replaces_record() {
    let mut first = portfolio(Strategy::Momentum, 3);
    first.current_return = 4.2;
    let existing = vec![first];

    let rotation = PortfolioRotation::plan(&existing, vec![portfolio(Strategy::Momentum, 3)]);
    assert!(rotation.superseded.is_empty());

    let mut store = keyed(&existing);
    rotation.apply_to(&mut store);

    assert_eq!(store.len(), 1);
    let current = &store["Momentum Kings - March 2025"];
    assert!(current.is_active());
    assert_eq!(current.current_return, 0.0);
}

#[test]
fn test_two_active_in_one_strategy_is_rejected() {
    let both = vec![portfolio(Strategy::Momentum, 2), portfolio(Strategy::Momentum, 3)];
    let err = check_single_active(both.iter()).unwrap_err();
    assert!(matches!(err, PipelineError::Invariant(_)));
}
