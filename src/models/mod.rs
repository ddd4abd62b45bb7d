//! Shared data models spanning the pipeline layers.

pub mod alert;
pub mod custom;
pub mod job;
pub mod market;
pub mod portfolio;
pub mod stock;

pub use alert::{AlertCondition, PriceAlert};
pub use custom::{CustomPortfolio, Trade, TradeSide, TradeStatus};
pub use job::{JobState, JobStatus};
pub use market::{HistoricalBar, Quote};
pub use portfolio::{
    Constituent, ModelPortfolio, PerformancePoint, PortfolioStatus, Strategy,
};
pub use stock::{IntradayUpdate, StockMetrics};
