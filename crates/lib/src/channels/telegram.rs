//! Telegram channel: webhook registration and inbound update payload types.
//!
//! This system is webhook-only: Telegram POSTs updates to the gateway, so the
//! only Bot API calls made here are deleteWebhook/setWebhook at startup and
//! shutdown. Replies go out through Chat2Desk, not back through Telegram.

use serde::Deserialize;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram update payload (webhook POST body).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Telegram Bot API client for webhook registration.
pub struct TelegramChannel {
    token: Option<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }

    fn token(&self) -> Result<&str, String> {
        self.token
            .as_deref()
            .ok_or_else(|| "telegram bot token not configured".to_string())
    }

    /// Register the webhook URL so Telegram POSTs updates to the gateway.
    pub async fn set_webhook(&self, url: &str) -> Result<(), String> {
        let token = self.token()?;
        let api_url = format!("{}/bot{}/setWebhook", TELEGRAM_API_BASE, token);
        let body = serde_json::json!({ "url": url });
        let res = self
            .client
            .post(&api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("setWebhook failed: {} {}", status, body));
        }
        Ok(())
    }

    /// Remove the webhook. With `drop_pending_updates`, updates queued while
    /// the gateway was down are discarded instead of replayed.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), String> {
        let token = self.token()?;
        let url = format!(
            "{}/bot{}/deleteWebhook?drop_pending_updates={}",
            TELEGRAM_API_BASE, token, drop_pending_updates
        );
        let res = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("deleteWebhook failed: {} {}", status, body));
        }
        Ok(())
    }
}
