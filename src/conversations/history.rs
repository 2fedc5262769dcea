use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{error, info};

use crate::assistant::ListOrder;
use crate::conversations::types::{HistoryKey, HistoryRequest, HistoryResponse};
use crate::conversations::utils::{chronological, clamp_limit, to_history_entry};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/history` — answers with `{thread_id, messages}`.
pub async fn history(
    State(state): State<AppState>,
    payload: Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Json(request) = payload?;
    fetch_history(&state, request, HistoryKey::Messages).await
}

/// `POST /api/chat/history` — answers with `{thread_id, history}`.
pub async fn chat_history(
    State(state): State<AppState>,
    payload: Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Json(request) = payload?;
    fetch_history(&state, request, HistoryKey::History).await
}

async fn fetch_history(
    state: &AppState,
    request: HistoryRequest,
    key: HistoryKey,
) -> Result<Json<HistoryResponse>, ApiError> {
    let thread_id = request.thread_id.trim().to_string();
    if thread_id.is_empty() {
        return Err(ApiError::BadRequest("thread_id is required".to_string()));
    }

    let backend = state.backend()?;
    let limit = clamp_limit(request.limit.unwrap_or(state.config.history.default_limit));
    info!("Retrieving history for thread {}, limit: {}", thread_id, limit);

    // Newest page first so the limit keeps the latest messages.
    let messages = backend
        .list_messages(&thread_id, ListOrder::Desc, limit)
        .await
        .map_err(|e| {
            error!("Error retrieving thread messages: {}", e);
            ApiError::Internal(format!("Unable to retrieve chat history: {}", e))
        })?;

    let entries = chronological(messages, ListOrder::Desc)
        .iter()
        .map(to_history_entry)
        .collect();

    Ok(Json(HistoryResponse::new(thread_id, entries, key)))
}
