use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::conversations::{chat, history};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Health check
        .route("/api/health", get(health_check))
        // Conversation routes
        .route("/api/chat", post(chat::chat))
        .route("/api/history", post(history::history))
        .route("/api/chat/history", post(history::chat_history))
}

/// Full application: routes, permissive CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Assistant relay is live!" }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let Some(backend) = state.assistant.as_ref() else {
        return Json(json!({
            "status": "unhealthy",
            "openai_connected": false,
            "error": "OpenAI API key not found"
        }));
    };

    match backend.list_models().await {
        Ok(_) => Json(json!({
            "status": "healthy",
            "openai_connected": true,
            "assistant_configured": state.config.openai.assistant_id.is_some()
        })),
        Err(e) => {
            warn!("Health check could not reach OpenAI: {}", e);
            Json(json!({
                "status": "unhealthy",
                "openai_connected": false,
                "error": e.to_string()
            }))
        }
    }
}
