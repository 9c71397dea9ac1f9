//! Assistant backend: thread/run API client and the run driver.
//!
//! The backend is behind a trait so the relay can be exercised without a live
//! network. `run_assistant` drives one thread → message → run → poll cycle
//! and extracts the reply text.

mod openai;
mod run;

pub use openai::OpenAiAssistantClient;
pub use run::{run_assistant, PollPolicy, RunError};

use async_trait::async_trait;
use serde::Deserialize;

/// Status of an assistant run. Polling continues while the status is
/// non-terminal (queued, in_progress, cancelling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Cancelling,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Cancelling => "cancelling",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
        }
    }
}

/// One message on a thread, reduced to role and text content blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<MessageText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
}

impl ThreadMessage {
    /// Value of the first text content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find_map(|c| c.text.as_ref())
            .map(|t| t.value.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("assistant api error: {0}")]
    Api(String),
}

/// Thread/run operations the run driver needs from an assistant backend.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Create a fresh conversation thread and return its id.
    async fn create_thread(&self) -> Result<String, AssistantError>;
    /// Append a user-role message to a thread.
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError>;
    /// Start a run of the given assistant against a thread; returns the run id.
    async fn create_run(&self, thread_id: &str, assistant_id: &str)
        -> Result<String, AssistantError>;
    /// Fetch the current status of a run.
    async fn run_status(&self, thread_id: &str, run_id: &str)
        -> Result<RunStatus, AssistantError>;
    /// List all messages on a thread, in API order.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError>;
}
