//! AlphaDesk - stock screening analysis and model portfolio pipeline
//!
//! Scheduled jobs compute per-stock performance/momentum/alpha metrics, build
//! strategy portfolios from them, track portfolio performance over time and
//! deliver price alerts.

pub mod alerts;
pub mod analysis;
pub mod common;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod portfolio;
pub mod queries;
pub mod services;

pub use error::{PipelineError, Result};
