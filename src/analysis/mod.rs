//! Per-stock analysis: full daily metrics, intraday refresh, session gate

pub mod intraday;
pub mod metrics;
pub mod session;

pub use intraday::{refresh_all, refresh_from_quote};
pub use metrics::{compute_stock_metrics, MetricsComputer, MetricsRun};
pub use session::MarketSession;
