//! deskrelay core library — config, channels, upstream clients, the relay
//! pipeline, and the webhook gateway used by the CLI.

pub mod assistant;
pub mod channels;
pub mod chat2desk;
pub mod config;
pub mod gateway;
pub mod init;
pub mod relay;
pub mod sanitize;
