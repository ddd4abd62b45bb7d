//! Outbound notification channel for triggered alerts

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Delivers a rendered message to a chat/channel id
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()>;
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API sender (`sendMessage`, Markdown)
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Notification(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }
}

#[async_trait]
impl NotificationSender for TelegramNotifier {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let body = SendMessageRequest {
            chat_id: channel_id,
            text: message,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Notification(format!("Telegram request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Notification(format!(
                "Telegram returned {}: {}",
                status, text
            )));
        }

        debug!(channel_id = %channel_id, "Telegram message delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// Fallback sender used when no bot token is configured: logs the message only
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()> {
        info!(channel_id = %channel_id, "Notification (not delivered, no channel configured): {}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
