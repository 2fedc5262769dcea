use async_trait::async_trait;
use thiserror::Error;

use super::types::{ListOrder, Run, Thread, ThreadMessage};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl AssistantError {
    /// True when the provider no longer knows the thread we tried to use.
    pub fn is_thread_not_found(&self) -> bool {
        match self {
            AssistantError::Api { status, message } => {
                let message = message.to_lowercase();
                *status == 404
                    || message.contains("thread not found")
                    || message.contains("no thread found")
            }
            _ => false,
        }
    }
}

/// Operations this service needs from the hosted assistant provider.
///
/// The provider owns threads, messages and runs; implementations only
/// forward calls and decode the results.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn create_thread(&self) -> Result<Thread, AssistantError>;

    /// Append a user message to a thread.
    async fn add_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ThreadMessage, AssistantError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, AssistantError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError>;

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError>;

    /// Returns model ids; used as a connectivity check.
    async fn list_models(&self) -> Result<Vec<String>, AssistantError>;

    /// Single-turn completion used when no assistant is configured.
    async fn chat_completion(&self, model: &str, message: &str) -> Result<String, AssistantError>;
}
