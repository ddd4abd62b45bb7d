//! Raw market data as delivered by a `MarketDataSource`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl HistoricalBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar where open/high/low/close are all the same price
    pub fn flat(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self::new(date, close, close, close, close, volume)
    }
}

/// Live quote snapshot. Every numeric field is optional because upstream
/// sources omit fields freely (indices have no EPS, new listings no averages).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_day_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_hundred_day_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_volume_3_month: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_trailing_twelve_months: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_previous_close(mut self, previous_close: f64) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        self.long_name = Some(name.into());
        self
    }

    pub fn with_fundamentals(mut self, eps: f64, trailing_pe: f64) -> Self {
        self.eps_trailing_twelve_months = Some(eps);
        self.trailing_pe = Some(trailing_pe);
        self
    }

    pub fn with_range(mut self, low_52w: f64, high_52w: f64) -> Self {
        self.fifty_two_week_low = Some(low_52w);
        self.fifty_two_week_high = Some(high_52w);
        self
    }

    /// Price, only when it is a usable positive number
    pub fn live_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Previous close, only when it is a usable positive number
    pub fn live_previous_close(&self) -> Option<f64> {
        self.previous_close.filter(|p| p.is_finite() && *p > 0.0)
    }
}
