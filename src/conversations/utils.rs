use chrono::{DateTime, Utc};

use crate::assistant::{ListOrder, ThreadMessage};
use crate::conversations::types::{ChatTurn, HistoryEntry};

/// Largest page the provider accepts when listing messages.
pub const MAX_LIST_LIMIT: u32 = 100;

/// Callers only ever see "user" or "assistant".
pub fn caller_role(role: &str) -> &'static str {
    if role == "user" {
        "user"
    } else {
        "assistant"
    }
}

pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIST_LIMIT)
}

/// Oldest first, by `created_at`. `listed` is the order the provider was
/// asked for; messages sharing a timestamp keep that order, flipped to
/// ascending when it was descending.
pub fn chronological(mut messages: Vec<ThreadMessage>, listed: ListOrder) -> Vec<ThreadMessage> {
    if listed == ListOrder::Desc {
        messages.reverse();
    }
    messages.sort_by_key(|m| m.created_at);
    messages
}

pub fn format_timestamp(created_at: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(created_at, 0).map(|dt| dt.to_rfc3339())
}

pub fn to_history_entry(message: &ThreadMessage) -> HistoryEntry {
    HistoryEntry {
        id: message.id.clone(),
        role: caller_role(&message.role).to_string(),
        content: message.text(),
        created_at: message.created_at,
        timestamp: format_timestamp(message.created_at),
    }
}

pub fn to_chat_turn(message: &ThreadMessage) -> ChatTurn {
    ChatTurn {
        role: caller_role(&message.role).to_string(),
        content: message.text(),
    }
}
