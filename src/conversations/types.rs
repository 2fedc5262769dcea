use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "default_user";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    pub fn user_id(&self) -> String {
        self.user_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
    }

    /// A blank thread id means "start a new conversation".
    pub fn existing_thread(&self) -> Option<&str> {
        self.thread_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Chat reply. `response` and `reply` carry the same text so both older and
/// newer frontends can read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub reply: String,
    pub user_id: String,
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ChatTurn>>,
}

impl ChatResponse {
    pub fn new(
        text: String,
        user_id: String,
        thread_id: Option<String>,
        history: Option<Vec<ChatTurn>>,
    ) -> Self {
        Self {
            response: text.clone(),
            reply: text,
            user_id,
            thread_id,
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: i64,
    /// RFC 3339 rendering of `created_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// History payload; `/api/history` fills `messages`, `/api/chat/history`
/// fills `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<HistoryEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKey {
    Messages,
    History,
}

impl HistoryResponse {
    pub fn new(thread_id: String, entries: Vec<HistoryEntry>, key: HistoryKey) -> Self {
        match key {
            HistoryKey::Messages => Self {
                thread_id,
                messages: Some(entries),
                history: None,
            },
            HistoryKey::History => Self {
                thread_id,
                messages: None,
                history: Some(entries),
            },
        }
    }
}
