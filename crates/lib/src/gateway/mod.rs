//! Gateway: the webhook HTTP server.
//!
//! One port, two routes: a health probe and the Telegram webhook that feeds
//! the relay. Wires the upstream clients together from config at startup.

mod server;

pub use server::{run_gateway, WebhookResponse};
