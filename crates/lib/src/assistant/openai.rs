//! OpenAI Assistants API client (threads, messages, runs).

use crate::assistant::{AssistantBackend, AssistantError, RunStatus, ThreadMessage};
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Every Assistants endpoint requires this beta opt-in header.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Client for the OpenAI Assistants HTTP API.
#[derive(Clone)]
pub struct OpenAiAssistantClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

impl OpenAiAssistantClient {
    pub fn new(base_url: Option<String>, api_key: String) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }
}

/// Read the body as JSON on success, or surface status + body as an Api error.
async fn parse_response<T: serde::de::DeserializeOwned>(
    res: reqwest::Response,
) -> Result<T, AssistantError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(AssistantError::Api(format!("{} {}", status, body)));
    }
    Ok(res.json().await?)
}

#[async_trait]
impl AssistantBackend for OpenAiAssistantClient {
    /// POST /threads — create an empty conversation thread.
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let res = self
            .post("/threads")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let data: ObjectId = parse_response(res).await?;
        Ok(data.id)
    }

    /// POST /threads/{id}/messages — append the user's text.
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        let res = self
            .post(&format!("/threads/{}/messages", thread_id))
            .json(&serde_json::json!({ "role": "user", "content": text }))
            .send()
            .await?;
        let _: ObjectId = parse_response(res).await?;
        Ok(())
    }

    /// POST /threads/{id}/runs — start the assistant against the thread.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String, AssistantError> {
        let res = self
            .post(&format!("/threads/{}/runs", thread_id))
            .json(&serde_json::json!({ "assistant_id": assistant_id }))
            .send()
            .await?;
        let data: ObjectId = parse_response(res).await?;
        Ok(data.id)
    }

    /// GET /threads/{id}/runs/{run_id} — current run status.
    async fn run_status(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, AssistantError> {
        let res = self
            .get(&format!("/threads/{}/runs/{}", thread_id, run_id))
            .send()
            .await?;
        let data: RunObject = parse_response(res).await?;
        Ok(data.status)
    }

    /// GET /threads/{id}/messages — all messages on the thread.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError> {
        let res = self
            .get(&format!("/threads/{}/messages", thread_id))
            .send()
            .await?;
        let data: MessageList = parse_response(res).await?;
        Ok(data.data)
    }
}
