use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::interface::{AssistantBackend, AssistantError};
use super::types::{
    CompletionMessage, CompletionRequest, CompletionResponse, CreateMessageRequest,
    CreateRunRequest, ErrorEnvelope, ListOrder, ListResponse, Model, Run, Thread, ThreadMessage,
};

const ASSISTANTS_BETA: &str = "assistants=v2";

/// Client for the OpenAI Assistants API (threads, messages, runs).
#[derive(Debug, Clone)]
pub struct OpenAIAssistantClient {
    client: Client,
    base_url: String,
}

impl OpenAIAssistantClient {
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AssistantError::Config(format!("Invalid API key format: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static("openai-beta"),
            HeaderValue::from_static(ASSISTANTS_BETA),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Initialized OpenAIAssistantClient: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AssistantError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the provider's own message over the raw body.
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| AssistantError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantBackend for OpenAIAssistantClient {
    async fn create_thread(&self) -> Result<Thread, AssistantError> {
        let url = self.url("/threads");
        self.send(self.client.post(&url).json(&serde_json::json!({})))
            .await
    }

    async fn add_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ThreadMessage, AssistantError> {
        let url = self.url(&format!("/threads/{}/messages", thread_id));
        let body = CreateMessageRequest {
            role: "user",
            content,
        };
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, AssistantError> {
        let url = self.url(&format!("/threads/{}/runs", thread_id));
        self.send(self.client.post(&url).json(&CreateRunRequest { assistant_id }))
            .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let url = self.url(&format!("/threads/{}/runs/{}", thread_id, run_id));
        self.send(self.client.get(&url)).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let url = self.url(&format!("/threads/{}/messages", thread_id));
        let limit = limit.to_string();
        let request = self
            .client
            .get(&url)
            .query(&[("order", order.as_str()), ("limit", limit.as_str())]);
        let list: ListResponse<ThreadMessage> = self.send(request).await?;
        debug!("Listed {} messages from thread {}", list.data.len(), thread_id);
        Ok(list.data)
    }

    async fn list_models(&self) -> Result<Vec<String>, AssistantError> {
        let url = self.url("/models");
        let list: ListResponse<Model> = self.send(self.client.get(&url)).await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn chat_completion(&self, model: &str, message: &str) -> Result<String, AssistantError> {
        let url = self.url("/chat/completions");
        let body = CompletionRequest {
            model,
            messages: vec![CompletionMessage {
                role: "user".to_string(),
                content: Some(message.to_string()),
            }],
        };
        let response: CompletionResponse = self.send(self.client.post(&url).json(&body)).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AssistantError::Decode("completion returned no choices".to_string()))
    }
}
