//! Gateway HTTP server: health route and the Telegram webhook entry point.

use crate::assistant::{OpenAiAssistantClient, PollPolicy};
use crate::channels::{InboundMessage, TelegramChannel, TelegramUpdate};
use crate::chat2desk::Chat2DeskClient;
use crate::config::{self, Config};
use crate::relay::{Relay, RelayOutcome};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Reported to the webhook caller when the payload has no usable message.
const DEFAULT_TEXT: &str = "No text provided";

#[derive(Clone)]
struct GatewayState {
    config: Config,
    relay: Arc<Relay>,
}

/// Webhook response body. The route always answers HTTP 200; the outcome is
/// carried in `status` ("sent" | "error") plus `response` or `message`.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl WebhookResponse {
    fn sent(response: String) -> Self {
        Self {
            status: "sent".to_string(),
            message: None,
            response: Some(response),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.to_string()),
            response: None,
        }
    }
}

/// Run the gateway: build the upstream clients from config, register the
/// Telegram webhook, and serve until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let chat2desk_token =
        config::resolve_chat2desk_token(&config).context("chat2desk token not configured")?;
    let api_key =
        config::resolve_assistant_api_key(&config).context("assistant api key not configured")?;
    let assistant_id =
        config::resolve_assistant_id(&config).context("assistant id not configured")?;

    let chat2desk = Chat2DeskClient::new(config.chat2desk.base_url.clone(), chat2desk_token);
    let assistant = OpenAiAssistantClient::new(config.assistant.base_url.clone(), api_key);
    let poll = PollPolicy {
        interval: Duration::from_millis(config.assistant.poll.interval_ms),
        max_interval: Duration::from_millis(config.assistant.poll.max_interval_ms),
        max_attempts: config.assistant.poll.max_attempts,
    };
    let relay = Arc::new(Relay::new(
        Arc::new(chat2desk),
        Arc::new(assistant),
        assistant_id,
        poll,
    ));

    // Webhook registration is best-effort plumbing: a failure is logged and
    // the server still starts (updates just stop arriving until it is fixed).
    let telegram_token = config::resolve_telegram_token(&config);
    let webhook_url = config.channels.telegram.webhook_url.clone();
    let telegram_for_shutdown: Option<Arc<TelegramChannel>> = match (telegram_token, webhook_url) {
        (Some(token), Some(url)) => {
            let telegram = Arc::new(TelegramChannel::new(Some(token)));
            if let Err(e) = telegram.delete_webhook(true).await {
                log::warn!("telegram delete_webhook failed: {}", e);
            }
            if let Err(e) = telegram.set_webhook(&url).await {
                log::warn!("telegram set_webhook failed: {}", e);
            } else {
                log::info!("telegram webhook registered: {}", url);
            }
            Some(telegram)
        }
        _ => {
            log::warn!("telegram token or webhook url not configured, skipping webhook registration");
            None
        }
    };

    let state = GatewayState {
        config: config.clone(),
        relay,
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/telegram/webhook", post(telegram_webhook))
        .with_state(state);

    let bind_addr = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(telegram_for_shutdown))
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or
/// SIGTERM). Removes the Telegram webhook before the server drains.
async fn shutdown_signal(telegram: Option<Arc<TelegramChannel>>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");

    if let Some(t) = telegram {
        if let Err(e) = t.delete_webhook(false).await {
            log::debug!("telegram delete_webhook on shutdown: {}", e);
        }
    }
}

/// POST /telegram/webhook — runs one update through the relay pipeline and
/// answers with the outcome. Always HTTP 200; malformed payloads get the
/// error-shaped body rather than an error status.
async fn telegram_webhook(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Json<WebhookResponse> {
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            log::warn!("unparseable webhook payload: {}", e);
            return Json(WebhookResponse::error("invalid update payload"));
        }
    };
    let Some(msg) = update.message else {
        return Json(WebhookResponse::error("update has no message"));
    };
    let inbound = InboundMessage {
        chat_id: msg.chat.id.to_string(),
        text: msg.text.unwrap_or_else(|| DEFAULT_TEXT.to_string()),
    };

    let response = match state.relay.handle(inbound).await {
        RelayOutcome::Delivered { text } => WebhookResponse::sent(text),
        RelayOutcome::DeliveredWithFallbackText { text } => WebhookResponse::sent(text),
        RelayOutcome::IdentityResolutionFailed => {
            WebhookResponse::error("Could not identify or create client in Chat2Desk")
        }
    };
    Json(response)
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
