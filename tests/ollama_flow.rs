//! End-to-end flow through the router with a mocked Ollama runtime.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use docchat::{
    api::create_router, documents::DocumentService, inference::OllamaChatClient, store::FileStore,
};
use httpmock::{Method::POST, MockServer};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "ollama-flow-boundary";

async fn build_app(ollama_url: String, media: &TempDir) -> Router {
    let store = FileStore::open(media.path()).await.expect("store");
    let client = OllamaChatClient::new(ollama_url, None).expect("client");
    let service = DocumentService::new(store, Box::new(client), "deepseek-r1:1.5b");
    create_router(Arc::new(service), 1024 * 1024)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&body).expect("json"))
}

fn upload_request(file_name: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/upload/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn chat_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/chat/")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

#[tokio::test]
async fn question_reaches_ollama_with_document_context() {
    let server = MockServer::start_async().await;
    let media = TempDir::new().expect("tempdir");
    let app = build_app(server.base_url(), &media).await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("\"model\":\"deepseek-r1:1.5b\"")
                .body_contains("\"stream\":false")
                .body_contains("The sky is blue")
                .body_contains("What color is the sky?");
            then.status(200).json_body(json!({
                "model": "deepseek-r1:1.5b",
                "message": {"role": "assistant", "content": "It is blue."},
                "done": true
            }));
        })
        .await;

    let (status, body) = call(&app, upload_request("sky.txt", "The sky is blue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_content"], "The sky is blue");

    let (status, body) = call(
        &app,
        chat_request(json!({"message": "What color is the sky?"})),
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "It is blue.", "confidence": 85}));
}

#[tokio::test]
async fn ollama_failure_becomes_server_error() {
    let server = MockServer::start_async().await;
    let media = TempDir::new().expect("tempdir");
    let app = build_app(server.base_url(), &media).await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(500).body("model not loaded");
        })
        .await;

    call(&app, upload_request("notes.txt", "Some notes")).await;
    let (status, body) = call(&app, chat_request(json!({"message": "Summarize"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().expect("error");
    assert!(error.contains("model not loaded"), "unexpected error: {error}");
}

#[tokio::test]
async fn uploads_survive_a_restart() {
    let server = MockServer::start_async().await;
    let media = TempDir::new().expect("tempdir");

    {
        let app = build_app(server.base_url(), &media).await;
        let (status, _) = call(&app, upload_request("kept.md", "Persisted text")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("Persisted text");
            then.status(200).json_body(json!({
                "message": {"role": "assistant", "content": "Still here."},
                "done": true
            }));
        })
        .await;

    let app = build_app(server.base_url(), &media).await;
    let (status, body) = call(&app, chat_request(json!({"message": "Still there?"}))).await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Still here.");
}

#[tokio::test]
#[ignore = "Requires a live Ollama runtime"]
async fn live_ollama_answers_question() {
    let ollama_url =
        std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
    let media = TempDir::new().expect("tempdir");
    let app = build_app(ollama_url, &media).await;

    call(&app, upload_request("sky.txt", "The sky is blue")).await;
    let (status, body) = call(
        &app,
        chat_request(json!({"message": "What color is the sky?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    assert!(body["response"].as_str().is_some_and(|text| !text.is_empty()));
}
