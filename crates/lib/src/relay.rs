//! Relay orchestrator: identity → assistant run → sanitize → delivery.
//!
//! One inbound message flows through the stages in order, each awaiting the
//! previous one. The failure policy is asymmetric: an identity failure aborts
//! the request, a run failure degrades to a fixed fallback text without
//! delivery, a delivery failure is logged and otherwise ignored.

use crate::assistant::{run_assistant, AssistantBackend, PollPolicy};
use crate::channels::InboundMessage;
use crate::chat2desk::{Chat2DeskClient, Chat2DeskError};
use crate::sanitize::sanitize;
use async_trait::async_trait;
use std::sync::Arc;

/// Reported when the assistant run does not produce a usable reply.
pub const FALLBACK_TEXT: &str = "Unable to get a response from the assistant.";

/// Customer-platform operations the relay needs: resolve a stable client id
/// for a chat, and deliver text to it.
#[async_trait]
pub trait CustomerPlatform: Send + Sync {
    async fn get_or_create_client(&self, chat_id: &str) -> Result<String, Chat2DeskError>;
    async fn send_message(&self, text: &str, client_id: &str) -> Result<(), Chat2DeskError>;
}

#[async_trait]
impl CustomerPlatform for Chat2DeskClient {
    async fn get_or_create_client(&self, chat_id: &str) -> Result<String, Chat2DeskError> {
        Chat2DeskClient::get_or_create_client(self, chat_id).await
    }

    async fn send_message(&self, text: &str, client_id: &str) -> Result<(), Chat2DeskError> {
        Chat2DeskClient::send_message(self, text, client_id).await
    }
}

/// How one inbound message ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Reply produced, sanitized, and handed to the delivery platform. A
    /// failed delivery call is logged but does not change the outcome.
    Delivered { text: String },
    /// The assistant run failed; the fallback text is reported to the caller
    /// and nothing is delivered.
    DeliveredWithFallbackText { text: String },
    /// The customer platform could not resolve a client id; no later stage ran.
    IdentityResolutionFailed,
}

/// The relay pipeline with its collaborators injected at construction.
pub struct Relay {
    platform: Arc<dyn CustomerPlatform>,
    assistant: Arc<dyn AssistantBackend>,
    assistant_id: String,
    poll: PollPolicy,
}

impl Relay {
    pub fn new(
        platform: Arc<dyn CustomerPlatform>,
        assistant: Arc<dyn AssistantBackend>,
        assistant_id: String,
        poll: PollPolicy,
    ) -> Self {
        Self {
            platform,
            assistant,
            assistant_id,
            poll,
        }
    }

    /// Run one inbound message through the full pipeline.
    pub async fn handle(&self, inbound: InboundMessage) -> RelayOutcome {
        log::info!(
            "received message from chat {}: '{}'",
            inbound.chat_id,
            inbound.text
        );

        let client_id = match self.platform.get_or_create_client(&inbound.chat_id).await {
            Ok(id) => id,
            Err(e) => {
                log::error!("failed to create or find the client in Chat2Desk: {}", e);
                return RelayOutcome::IdentityResolutionFailed;
            }
        };

        let raw = match run_assistant(
            self.assistant.as_ref(),
            &self.assistant_id,
            &inbound.text,
            &self.poll,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to get a response from the assistant: {}", e);
                return RelayOutcome::DeliveredWithFallbackText {
                    text: FALLBACK_TEXT.to_string(),
                };
            }
        };

        let text = sanitize(&raw);
        log::info!("answer from assistant: '{}'", text);

        if let Err(e) = self.platform.send_message(&text, &client_id).await {
            log::error!("failed to send message to chat {}: {}", inbound.chat_id, e);
        } else {
            log::info!("message delivered to chat {}", inbound.chat_id);
        }

        RelayOutcome::Delivered { text }
    }
}
