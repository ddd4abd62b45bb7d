//! Portfolio rotation: the single transition that supersedes the currently
//! active portfolios and activates a new generation.
//!
//! Each strategy moves through `no-active -> Active -> Superseded`. A rotation
//! is planned as a pure value, checked, and then handed to the store which
//! applies it in one atomic step.

use crate::error::{PipelineError, Result};
use crate::models::{ModelPortfolio, PortfolioStatus, Strategy};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRotation {
    /// Names of currently-active portfolios that become Superseded
    pub superseded: Vec<String>,
    /// New portfolios, all Active, replacing any record with the same name
    pub activated: Vec<ModelPortfolio>,
}

impl PortfolioRotation {
    /// Plan a rotation. Every active portfolio is superseded even when the
    /// new generation is empty.
    pub fn plan(existing: &[ModelPortfolio], incoming: Vec<ModelPortfolio>) -> Self {
        let activated: Vec<ModelPortfolio> = incoming
            .into_iter()
            .map(|mut p| {
                p.status = PortfolioStatus::Active;
                p
            })
            .collect();

        let superseded = existing
            .iter()
            .filter(|p| p.is_active())
            .filter(|p| !activated.iter().any(|a| a.name == p.name))
            .map(|p| p.name.clone())
            .collect();

        Self {
            superseded,
            activated,
        }
    }

    pub fn noop() -> Self {
        Self {
            superseded: Vec::new(),
            activated: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.superseded.is_empty() && self.activated.is_empty()
    }

    /// Apply to an in-memory collection keyed by name
    pub fn apply_to(&self, portfolios: &mut HashMap<String, ModelPortfolio>) {
        if self.is_noop() {
            return;
        }
        // Supersede every active record, not only the planned names.
        for portfolio in portfolios.values_mut() {
            if portfolio.is_active() {
                portfolio.status = PortfolioStatus::Superseded;
            }
        }
        for portfolio in &self.activated {
            portfolios.insert(portfolio.name.clone(), portfolio.clone());
        }
    }

    /// Check the planned end state: at most one active portfolio per strategy
    pub fn verify(&self) -> Result<()> {
        check_single_active(self.activated.iter())
    }
}

/// Fail if any strategy has more than one active portfolio
pub fn check_single_active<'a>(portfolios: impl Iterator<Item = &'a ModelPortfolio>) -> Result<()> {
    let mut active: HashMap<Strategy, &str> = HashMap::new();
    for p in portfolios.filter(|p| p.is_active()) {
        if let Some(other) = active.insert(p.strategy, &p.name) {
            return Err(PipelineError::Invariant(format!(
                "two active {} portfolios: '{}' and '{}'",
                p.strategy, other, p.name
            )));
        }
    }
    Ok(())
}
