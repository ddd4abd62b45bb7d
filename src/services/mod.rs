//! External collaborators: market data and notifications

pub mod market_data;
pub mod notification;
pub mod yahoo;

pub use market_data::{MarketDataSource, StaticMarketData};
pub use notification::{LogNotifier, NotificationSender, TelegramNotifier};
pub use yahoo::YahooFinanceClient;
