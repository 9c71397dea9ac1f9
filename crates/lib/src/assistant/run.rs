//! Run driver: one thread → message → run → poll cycle against a backend.
//!
//! Each inbound message gets an isolated thread; no history is carried over.
//! The poll loop is bounded (max attempts, capped backoff) so a stuck run
//! cannot suspend a handler indefinitely.

use crate::assistant::{AssistantBackend, AssistantError, RunStatus};
use std::time::Duration;

/// Polling bounds for run status.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay before the second status fetch.
    pub interval: Duration,
    /// Cap for the doubling delay.
    pub max_interval: Duration,
    /// Maximum number of status fetches before giving up.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Backend(#[from] AssistantError),
    #[error("assistant run ended without completing: {}", .0.as_str())]
    Unfinished(RunStatus),
    #[error("assistant run still not terminal after {attempts} status fetches")]
    TimedOut { attempts: u32 },
}

/// Drive one run to a terminal state and return the reply text.
///
/// Sequence: create thread, append the user message, start a run, poll status
/// until terminal. On completion, assistant-role messages contribute their
/// first text block each, joined with single spaces. The first failed step
/// aborts; nothing is retried.
pub async fn run_assistant<B>(
    backend: &B,
    assistant_id: &str,
    user_text: &str,
    policy: &PollPolicy,
) -> Result<String, RunError>
where
    B: AssistantBackend + ?Sized,
{
    let thread_id = backend.create_thread().await?;
    backend.add_user_message(&thread_id, user_text).await?;
    let run_id = backend.create_run(&thread_id, assistant_id).await?;

    let mut status = backend.run_status(&thread_id, &run_id).await?;
    let mut attempts: u32 = 1;
    let mut delay = policy.interval;
    while !status.is_terminal() {
        if attempts >= policy.max_attempts {
            return Err(RunError::TimedOut { attempts });
        }
        tokio::time::sleep(delay).await;
        delay = std::cmp::min(delay * 2, policy.max_interval);
        status = backend.run_status(&thread_id, &run_id).await?;
        attempts += 1;
    }

    if status != RunStatus::Completed {
        return Err(RunError::Unfinished(status));
    }

    let messages = backend.list_messages(&thread_id).await?;
    let reply = messages
        .iter()
        .filter(|m| m.role == "assistant")
        .filter_map(|m| m.first_text())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(reply)
}
