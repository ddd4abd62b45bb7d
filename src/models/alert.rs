//! User price alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "above" => Some(AlertCondition::Above),
            "below" => Some(AlertCondition::Below),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        }
    }

    /// Strict crossing test against the target
    pub fn is_met(&self, price: f64, target: f64) -> bool {
        match self {
            AlertCondition::Above => price > target,
            AlertCondition::Below => price < target,
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub user_id: String,
    pub ticker: String,
    pub target_price: f64,
    pub condition: AlertCondition,
    pub active: bool,
    /// Notification channel the alert was created from (chat id)
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl PriceAlert {
    pub fn new(
        user_id: impl Into<String>,
        ticker: impl Into<String>,
        target_price: f64,
        condition: AlertCondition,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            ticker: ticker.into().trim().to_uppercase(),
            target_price,
            condition,
            active: true,
            channel_id: channel_id.into(),
            created_at: Utc::now(),
            triggered_at: None,
        }
    }
}
