use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{error, info};

use crate::assistant::{wait_for_run, AssistantBackend, ListOrder, ThreadMessage};
use crate::conversations::types::{ChatRequest, ChatResponse};
use crate::conversations::utils::{chronological, clamp_limit, to_chat_turn};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("No message provided.".to_string()));
    }

    let backend = state.backend()?;
    let user_id = request.user_id();

    let Some(assistant_id) = state.config.openai.assistant_id.as_deref() else {
        return completion_fallback(&state, backend.as_ref(), &request.message, user_id).await;
    };

    info!(
        "Processing message from user {}, thread_id: {:?}",
        user_id, request.thread_id
    );

    let thread_id = match request.existing_thread() {
        Some(id) => id.to_string(),
        None => {
            let thread = backend.create_thread().await.map_err(|e| {
                error!("Error creating thread: {}", e);
                ApiError::from(e)
            })?;
            info!("Created new thread {} for user {}", thread.id, user_id);
            thread.id
        }
    };

    let thread_id = post_user_message(&backend, thread_id, &request.message).await?;

    info!("Running assistant {} on thread {}", assistant_id, thread_id);
    let run = backend
        .create_run(&thread_id, assistant_id)
        .await
        .map_err(|e| {
            error!("Error starting run on thread {}: {}", thread_id, e);
            ApiError::from(e)
        })?;

    wait_for_run(
        backend.as_ref(),
        &thread_id,
        &run.id,
        &state.config.poll_settings(),
    )
    .await?;

    info!("Retrieving latest messages from thread {}", thread_id);
    let window = clamp_limit(state.config.history.chat_window);
    let recent = backend
        .list_messages(&thread_id, ListOrder::Desc, window)
        .await
        .map_err(|e| {
            error!("Error listing messages for thread {}: {}", thread_id, e);
            ApiError::from(e)
        })?;

    let reply = reply_from_run(&recent, &run.id)
        .map(|m| m.text())
        .ok_or_else(|| {
            error!("Run {} left no assistant message in thread {}", run.id, thread_id);
            ApiError::Internal("No response message found from assistant".to_string())
        })?;
    info!("Retrieved assistant response ({} chars)", reply.chars().count());

    let history = chronological(recent, ListOrder::Desc)
        .iter()
        .map(to_chat_turn)
        .collect();

    Ok(Json(ChatResponse::new(
        reply,
        user_id,
        Some(thread_id),
        Some(history),
    )))
}

/// Newest assistant message written by `run_id`.
fn reply_from_run<'a>(newest_first: &'a [ThreadMessage], run_id: &str) -> Option<&'a ThreadMessage> {
    newest_first
        .iter()
        .find(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run_id))
}

/// Adds the user's message, recreating the thread once if the provider has
/// forgotten it. Returns the thread id the message ended up in.
async fn post_user_message(
    backend: &Arc<dyn AssistantBackend>,
    thread_id: String,
    message: &str,
) -> Result<String, ApiError> {
    match backend.add_message(&thread_id, message).await {
        Ok(_) => {
            info!("Added message to thread {}", thread_id);
            Ok(thread_id)
        }
        Err(e) if e.is_thread_not_found() => {
            info!("Thread {} not found, creating new thread", thread_id);
            let thread = backend.create_thread().await.map_err(|e| {
                error!("Error recreating thread to replace {}: {}", thread_id, e);
                ApiError::from(e)
            })?;
            backend.add_message(&thread.id, message).await.map_err(|e| {
                error!("Error adding message to new thread {}: {}", thread.id, e);
                ApiError::Internal(format!("Error adding message: {}", e))
            })?;
            info!("Created new thread {} and added message", thread.id);
            Ok(thread.id)
        }
        Err(e) => {
            error!("Error adding message to thread {}: {}", thread_id, e);
            Err(ApiError::Internal(format!("Error adding message: {}", e)))
        }
    }
}

async fn completion_fallback(
    state: &AppState,
    backend: &dyn AssistantBackend,
    message: &str,
    user_id: String,
) -> Result<Json<ChatResponse>, ApiError> {
    let model = &state.config.openai.fallback_model;
    info!("No assistant configured, using chat completion with {}", model);

    let reply = backend.chat_completion(model, message).await.map_err(|e| {
        error!("Chat completion failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(ChatResponse::new(reply, user_id, None, None)))
}
