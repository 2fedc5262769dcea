use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::assistant::{AssistantBackend, OpenAIAssistantClient};
use crate::config::Config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured.
    pub assistant: Option<Arc<dyn AssistantBackend>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let assistant: Option<Arc<dyn AssistantBackend>> = match &config.openai.api_key {
            Some(api_key) => Some(Arc::new(OpenAIAssistantClient::new(
                api_key,
                config.openai.base_url.clone(),
                Duration::from_secs(config.openai.request_timeout_secs),
            )?)),
            None => {
                warn!("OPENAI_API_KEY not found in environment variables");
                None
            }
        };

        if config.openai.assistant_id.is_none() {
            warn!("OPENAI_ASSISTANT_ID not found; chat falls back to plain completions");
        }

        Ok(Self::with_backend(config, assistant))
    }

    pub fn with_backend(config: Config, assistant: Option<Arc<dyn AssistantBackend>>) -> Self {
        Self { config, assistant }
    }

    pub fn backend(&self) -> Result<Arc<dyn AssistantBackend>, ApiError> {
        self.assistant
            .clone()
            .ok_or_else(|| ApiError::Internal("OpenAI API key not configured".to_string()))
    }
}
