#![allow(dead_code)]

use assistant_relay::{build_router, AppState, Config};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const ASSISTANT_ID: &str = "asst_test";

/// Config pointing at the mock provider, with a fast poll loop.
pub fn test_config(server: &MockServer, assistant_id: Option<&str>) -> Config {
    let mut config = Config::default();
    config.openai.api_key = Some(API_KEY.to_string());
    config.openai.assistant_id = assistant_id.map(str::to_string);
    config.openai.base_url = server.uri();
    config.openai.request_timeout_secs = 5;
    config.polling.max_retries = 5;
    config.polling.interval_ms = 1;
    config
}

pub fn app(config: Config) -> Router {
    let state = AppState::new(config).expect("Failed to build app state");
    build_router(state)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn message_json(id: &str, thread_id: &str, role: &str, text: &str, created_at: i64) -> Value {
    json!({
        "id": id,
        "object": "thread.message",
        "thread_id": thread_id,
        "role": role,
        "created_at": created_at,
        "content": [{"type": "text", "text": {"value": text, "annotations": []}}]
    })
}

/// Assistant message written by `run_id`.
pub fn reply_json(id: &str, thread_id: &str, run_id: &str, text: &str, created_at: i64) -> Value {
    let mut message = message_json(id, thread_id, "assistant", text, created_at);
    message["run_id"] = json!(run_id);
    message
}

pub fn run_json(run_id: &str, thread_id: &str, status: &str) -> Value {
    json!({
        "id": run_id,
        "object": "thread.run",
        "thread_id": thread_id,
        "assistant_id": ASSISTANT_ID,
        "status": status,
        "last_error": null
    })
}

pub fn list_json(data: Vec<Value>) -> Value {
    json!({"object": "list", "data": data, "has_more": false})
}

pub fn provider_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": {"message": message, "type": "invalid_request_error", "code": null}
    }))
}

pub async fn mock_create_thread(server: &MockServer, thread_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/threads"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .and(header("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": thread_id,
            "object": "thread",
            "created_at": 1_700_000_000
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mock_add_message(server: &MockServer, thread_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/threads/{}/messages", thread_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(
            "msg_user",
            thread_id,
            "user",
            "ignored",
            1_700_000_001,
        )))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mock_create_run(server: &MockServer, thread_id: &str, run_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/threads/{}/runs", thread_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json(run_id, thread_id, "queued")))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves `status` for the next `times` retrievals of the run.
pub async fn mock_run_status(
    server: &MockServer,
    thread_id: &str,
    run_id: &str,
    status: &str,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/threads/{}/runs/{}", thread_id, run_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json(run_id, thread_id, status)))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mock_list_messages(server: &MockServer, thread_id: &str, newest_first: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/threads/{}/messages", thread_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(newest_first)))
        .mount(server)
        .await;
}
