//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.deskrelay/config.json`) and
//! environment. Tokens can always be supplied via environment variables so a
//! deployment never has to write secrets to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Assistant backend settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Chat2Desk delivery platform settings.
    #[serde(default)]
    pub chat2desk: Chat2DeskConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 8000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Public URL Telegram POSTs updates to (the gateway's /telegram/webhook
    /// route). Registration is skipped when unset.
    pub webhook_url: Option<String>,
}

/// Assistant backend config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// API key. Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,
    /// Assistant to run against each thread. Overridden by ASSISTANT_ID env.
    pub assistant_id: Option<String>,
    /// Override the API base URL (tests, proxies).
    pub base_url: Option<String>,
    /// Run-status polling bounds.
    #[serde(default)]
    pub poll: PollConfig,
}

/// Poll bounds: fixed start interval doubling to a cap, bounded attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_max_interval_ms")]
    pub max_interval_ms: u64,
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_max_interval_ms() -> u64 {
    5000
}

fn default_poll_max_attempts() -> u32 {
    120
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_interval_ms: default_poll_max_interval_ms(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

/// Chat2Desk config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat2DeskConfig {
    /// API token. Overridden by CHAT2DESK_TOKEN env when set.
    pub token: Option<String>,
    /// Override the API base URL (tests).
    pub base_url: Option<String>,
}

fn env_or(var: &str, from_config: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            from_config
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    env_or("TELEGRAM_BOT_TOKEN", config.channels.telegram.bot_token.as_ref())
}

/// Resolve the Chat2Desk token: env CHAT2DESK_TOKEN overrides config.
pub fn resolve_chat2desk_token(config: &Config) -> Option<String> {
    env_or("CHAT2DESK_TOKEN", config.chat2desk.token.as_ref())
}

/// Resolve the assistant API key: env OPENAI_API_KEY overrides config.
pub fn resolve_assistant_api_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.assistant.api_key.as_ref())
}

/// Resolve the assistant id: env ASSISTANT_ID overrides config.
pub fn resolve_assistant_id(config: &Config) -> Option<String> {
    env_or("ASSISTANT_ID", config.assistant.assistant_id.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("DESKRELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".deskrelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or DESKRELAY_CONFIG_PATH). Missing file
/// => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8000);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn default_poll_bounds() {
        let p = PollConfig::default();
        assert_eq!(p.interval_ms, 1000);
        assert_eq!(p.max_interval_ms, 5000);
        assert_eq!(p.max_attempts, 120);
    }

    #[test]
    fn empty_json_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 8000);
        assert!(config.channels.telegram.bot_token.is_none());
        assert!(config.assistant.assistant_id.is_none());
        assert!(config.chat2desk.token.is_none());
    }

    #[test]
    fn camel_case_fields_parse() {
        let config: Config = serde_json::from_str(
            r#"{
                "gateway": { "port": 9000 },
                "channels": { "telegram": { "botToken": "t", "webhookUrl": "https://x/telegram/webhook" } },
                "assistant": { "assistantId": "asst_1", "poll": { "maxAttempts": 3 } },
                "chat2desk": { "token": "c2d" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.channels.telegram.bot_token.as_deref(), Some("t"));
        assert_eq!(config.assistant.assistant_id.as_deref(), Some("asst_1"));
        assert_eq!(config.assistant.poll.max_attempts, 3);
        assert_eq!(config.assistant.poll.interval_ms, 1000);
        assert_eq!(config.chat2desk.token.as_deref(), Some("c2d"));
    }
}
