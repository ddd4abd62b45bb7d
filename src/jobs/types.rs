//! Job identities for the scheduled pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every scheduled job the worker knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobName {
    IntradayStockUpdate,
    DailyStockAnalysis,
    DailyPerformanceUpdate,
    MonthlyPortfolioCreation,
    PriceAlertChecks,
    CustomPortfolioValuation,
}

impl JobName {
    pub fn all() -> &'static [JobName] {
        &[
            JobName::IntradayStockUpdate,
            JobName::DailyStockAnalysis,
            JobName::DailyPerformanceUpdate,
            JobName::MonthlyPortfolioCreation,
            JobName::PriceAlertChecks,
            JobName::CustomPortfolioValuation,
        ]
    }

    /// Human-readable name shown in the status table
    pub fn display_name(&self) -> &'static str {
        match self {
            JobName::IntradayStockUpdate => "Intraday Stock Update",
            JobName::DailyStockAnalysis => "Daily Stock Analysis",
            JobName::DailyPerformanceUpdate => "Daily Performance Update",
            JobName::MonthlyPortfolioCreation => "Monthly Portfolio Creation",
            JobName::PriceAlertChecks => "Price Alert Checks",
            JobName::CustomPortfolioValuation => "Custom Portfolio Valuation",
        }
    }

    /// Short machine name, used for metrics labels and the worker CLI
    pub fn slug(&self) -> &'static str {
        match self {
            JobName::IntradayStockUpdate => "intraday",
            JobName::DailyStockAnalysis => "daily-analysis",
            JobName::DailyPerformanceUpdate => "performance",
            JobName::MonthlyPortfolioCreation => "portfolio-creation",
            JobName::PriceAlertChecks => "alerts",
            JobName::CustomPortfolioValuation => "custom-valuation",
        }
    }

    /// Accepts either the slug or the display name (case-insensitive)
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::all().iter().copied().find(|job| {
            job.slug().eq_ignore_ascii_case(needle) || job.display_name().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a job run did, recorded as the status outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(String),
    /// Gate closed (e.g. market hours); a successful no-op
    Skipped(String),
}

impl JobOutcome {
    pub fn summary(&self) -> String {
        match self {
            JobOutcome::Completed(s) => s.clone(),
            JobOutcome::Skipped(reason) => format!("skipped: {}", reason),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Completed(_) => "ok",
            JobOutcome::Skipped(_) => "skipped",
        }
    }
}
