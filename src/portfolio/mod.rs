//! Model portfolio construction, tracking and the user-facing portfolio tools

pub mod backtest;
pub mod custom;
pub mod lifecycle;
pub mod rebalance;
pub mod selector;
pub mod tracker;

pub use lifecycle::PortfolioRotation;
pub use selector::PortfolioSelector;
pub use tracker::update_performance;
