//! Inbound message from the messaging platform: handed to the relay for one
//! request/response cycle.

/// One webhook update reduced to what the relay needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Telegram chat id, kept opaque (stringified).
    pub chat_id: String,
    pub text: String,
}
