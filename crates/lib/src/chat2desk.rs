//! Chat2Desk API client (https://api.chat2desk.com/v1 by default).
//!
//! Two operations: get-or-create a client record for a chat id, and send an
//! outbound message addressed to a client id. Client creation tolerates the
//! "already exist" conflict by extracting the existing id from the error body.

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.chat2desk.com/v1";

/// Transport label sent with every Chat2Desk request.
const TRANSPORT: &str = "telegram";

/// Client for the Chat2Desk HTTP API.
#[derive(Clone)]
pub struct Chat2DeskClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum Chat2DeskError {
    #[error("chat2desk request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat2desk api error: {0}")]
    Api(String),
    #[error("chat2desk conflict body not in expected format: {0}")]
    ConflictParse(String),
}

#[derive(Debug, Deserialize)]
struct CreateClientResponse {
    data: CreatedClient,
}

#[derive(Debug, Deserialize)]
struct CreatedClient {
    id: serde_json::Value,
}

/// Error body returned on a duplicate-client conflict. The existing id is
/// carried in the second `errors.client` entry after a colon.
#[derive(Debug, Deserialize)]
struct ConflictBody {
    errors: ConflictErrors,
}

#[derive(Debug, Deserialize)]
struct ConflictErrors {
    #[serde(default)]
    client: Vec<String>,
}

impl Chat2DeskClient {
    pub fn new(base_url: Option<String>, token: String) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// POST /clients — create a client record for a chat id, or resolve the
    /// existing one on a duplicate conflict. Resolving the same chat id twice
    /// yields the same client id either way.
    pub async fn get_or_create_client(&self, chat_id: &str) -> Result<String, Chat2DeskError> {
        let url = format!("{}/clients", self.base_url);
        let body = serde_json::json!({ "phone": chat_id, "transport": TRANSPORT });
        let res = self
            .client
            .post(&url)
            .header("Authorization", &self.token)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if status.is_success() {
            let data: CreateClientResponse = res.json().await?;
            return client_id_string(data.data.id);
        }
        let text = res.text().await.unwrap_or_default();
        if status.as_u16() == 400 && text.contains("already exist") {
            return extract_conflict_id(&text);
        }
        Err(Chat2DeskError::Api(format!("{} {}", status, text)))
    }

    /// POST /messages — deliver text to a client over the fixed transport.
    pub async fn send_message(&self, text: &str, client_id: &str) -> Result<(), Chat2DeskError> {
        let url = format!("{}/messages", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("Authorization", &self.token)
            .query(&[
                ("text", text),
                ("client_id", client_id),
                ("transport", TRANSPORT),
            ])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(Chat2DeskError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

/// The id field arrives as a number on create and as a string elsewhere.
fn client_id_string(id: serde_json::Value) -> Result<String, Chat2DeskError> {
    match id {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(Chat2DeskError::Api(format!(
            "unexpected client id in response: {}",
            other
        ))),
    }
}

/// Parse the documented conflict schema and pull the existing client id out of
/// the second `errors.client` entry ("...: <id>"). Anything that does not
/// match the schema fails closed rather than risking a wrong id.
fn extract_conflict_id(body: &str) -> Result<String, Chat2DeskError> {
    let parsed: ConflictBody = serde_json::from_str(body)
        .map_err(|_| Chat2DeskError::ConflictParse(body.to_string()))?;
    let id = parsed
        .errors
        .client
        .get(1)
        .and_then(|entry| entry.split(':').nth(1))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Chat2DeskError::ConflictParse(body.to_string()))?;
    Ok(id)
}
