//! Chat-completion client for the locally hosted language model.
//!
//! The model is a black box: callers send a model id plus role-tagged messages and get back the
//! assistant's text, passed through unmodified. The Ollama adapter talks to `/api/chat` with
//! streaming disabled and waits for the complete answer.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by inference providers.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Provider could not be reached or is not serving the chat endpoint.
    #[error("Inference provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider did not answer within the configured timeout.
    #[error("Inference request timed out: {0}")]
    Timeout(String),
    /// Provider returned an error response.
    #[error("Failed to generate response: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions framing the model's behavior.
    System,
    /// Content supplied on behalf of the end user.
    User,
}

/// One role-tagged message in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Request passed to an [`InferenceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Ordered conversation, typically `[system, user]`.
    pub messages: Vec<ChatMessage>,
}

/// Interface implemented by chat-completion backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate a single assistant reply for the given conversation.
    async fn chat(&self, request: ChatRequest) -> Result<String, InferenceError>;
}

/// [`InferenceClient`] backed by an Ollama runtime.
pub struct OllamaChatClient {
    http: Client,
    base_url: String,
}

impl OllamaChatClient {
    /// Create a client for `base_url`; `timeout` of `None` waits for the model indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, InferenceError> {
        let mut builder = Client::builder().user_agent("docchat/chat");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|error| {
            InferenceError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
        })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        Self::new(
            config.ollama_url.clone(),
            config.inference_timeout_secs.map(Duration::from_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct OllamaChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait]
impl InferenceClient for OllamaChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, InferenceError> {
        let payload = OllamaChatPayload {
            model: &request.model,
            messages: &request.messages,
            stream: false,
        };
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat request to Ollama"
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    InferenceError::Timeout(format!(
                        "Ollama at {} did not answer: {error}",
                        self.base_url
                    ))
                } else {
                    InferenceError::ProviderUnavailable(format!(
                        "failed to reach Ollama at {}: {error}",
                        self.base_url
                    ))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(InferenceError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn sample_request() -> ChatRequest {
        ChatRequest {
            model: "deepseek-r1:1.5b".into(),
            messages: vec![
                ChatMessage::system("Be brief."),
                ChatMessage::user("What color is the sky?"),
            ],
        }
    }

    #[test]
    fn roles_serialize_lowercase() {
        let value = serde_json::to_value(ChatMessage::system("hi")).expect("json");
        assert_eq!(value, json!({"role": "system", "content": "hi"}));
    }

    #[tokio::test]
    async fn ollama_client_returns_message_content_verbatim() {
        let server = MockServer::start_async().await;
        let client = OllamaChatClient::new(server.base_url(), None).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .json_body(json!({
                        "model": "deepseek-r1:1.5b",
                        "messages": [
                            {"role": "system", "content": "Be brief."},
                            {"role": "user", "content": "What color is the sky?"}
                        ],
                        "stream": false
                    }));
                then.status(200).json_body(json!({
                    "model": "deepseek-r1:1.5b",
                    "message": {"role": "assistant", "content": "  Blue.\n"},
                    "done": true
                }));
            })
            .await;

        let answer = client.chat(sample_request()).await.expect("answer");

        mock.assert_async().await;
        assert_eq!(answer, "  Blue.\n");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = OllamaChatClient::new(server.base_url(), None).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500).body("boom");
            })
            .await;

        let error = client.chat(sample_request()).await.expect_err("error");
        assert!(
            matches!(
                &error,
                InferenceError::GenerationFailed(message)
                    if message.contains("500") && message.contains("boom")
            ),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn ollama_client_reports_missing_endpoint() {
        let server = MockServer::start_async().await;
        let client =
            OllamaChatClient::new(format!("{}/", server.base_url()), None).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(404);
            })
            .await;

        let error = client.chat(sample_request()).await.expect_err("404");
        assert!(matches!(error, InferenceError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn ollama_client_rejects_incomplete_response() {
        let server = MockServer::start_async().await;
        let client = OllamaChatClient::new(server.base_url(), None).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({
                    "message": {"role": "assistant", "content": "partial"},
                    "done": false
                }));
            })
            .await;

        let error = client.chat(sample_request()).await.expect_err("incomplete");
        assert!(matches!(error, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn ollama_client_times_out_when_configured() {
        let server = MockServer::start_async().await;
        let client = OllamaChatClient::new(server.base_url(), Some(Duration::from_millis(100)))
            .expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(json!({
                        "message": {"role": "assistant", "content": "late"},
                        "done": true
                    }));
            })
            .await;

        let error = client.chat(sample_request()).await.expect_err("timeout");
        assert!(matches!(error, InferenceError::Timeout(_)), "unexpected error: {error:?}");
    }
}
