//! HTTP surface for docchat.
//!
//! Two endpoints make up the whole API:
//!
//! - `POST /upload/` – Multipart upload (field `file`). Stores the payload and returns its record
//!   with a preview of at most 10,000 characters of extracted text.
//! - `POST /chat/` – JSON `{ "message": string, "detailed"?: bool }`. Answers the question using
//!   the most recently uploaded file and returns `{ "response", "confidence" }`.
//!
//! Every failure is rendered as JSON. Error kinds from the document service are mapped to status
//! codes in one place, `AppError`.

use crate::documents::{ChatError, DocumentApi, UploadError};
use crate::store::{FILE_FIELD, UploadedFile, ValidationErrors};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build the HTTP router exposing the upload and chat endpoints.
///
/// `max_upload_bytes` caps request bodies on every route.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/upload/", post(upload_file::<S>))
        .route("/chat/", post(chat_query::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Success response for `POST /upload/`.
#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    file: UploadedFile,
    file_content: String,
}

struct FilePart {
    file_name: String,
    data: Bytes,
}

/// Store an uploaded document and return a preview of its text.
async fn upload_file<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentApi,
{
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Upload request is not multipart");
        AppError::no_file()
    })?;
    let Some(part) = read_file_field(&mut multipart).await? else {
        tracing::warn!("Upload request with no file");
        return Err(AppError::no_file());
    };

    tracing::debug!(
        file_name = %part.file_name,
        bytes = part.data.len(),
        "Processing file upload"
    );
    let outcome = service
        .upload(&part.data, Some(&part.file_name))
        .await?;
    tracing::info!(
        id = outcome.record.id,
        file = %outcome.record.file,
        preview_chars = outcome.preview.chars().count(),
        "Upload completed"
    );

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        file: outcome.record,
        file_content: outcome.preview,
    }))
}

/// Return the first file part named `file`.
///
/// Other form fields are skipped, as is a plain text field named `file` (a part without a
/// `filename` is not an upload).
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<FilePart>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let data = field.bytes().await?;
        return Ok(Some(FilePart { file_name, data }));
    }
    Ok(None)
}

/// Request body for `POST /chat/`.
#[derive(Deserialize)]
struct ChatRequestBody {
    /// Question to answer; missing and empty are both rejected.
    #[serde(default)]
    message: Option<String>,
    /// Ask for a detailed rather than concise answer (defaults to `false`).
    #[serde(default)]
    detailed: Option<bool>,
}

/// Success response for `POST /chat/`.
#[derive(Serialize)]
struct ChatResponseBody {
    response: String,
    confidence: u8,
}

/// Answer a question about the most recently uploaded document.
async fn chat_query<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Json<ChatResponseBody>, AppError>
where
    S: DocumentApi,
{
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let answer = service
        .ask(
            body.message.as_deref().unwrap_or_default(),
            body.detailed.unwrap_or(false),
        )
        .await?;

    Ok(Json(ChatResponseBody {
        response: answer.response,
        confidence: answer.confidence,
    }))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Boundary error translating service failures into status codes and JSON bodies.
enum AppError {
    BadRequest(String),
    Multipart(MultipartError),
    Upload(UploadError),
    Chat(ChatError),
}

impl AppError {
    fn no_file() -> Self {
        Self::BadRequest("No file provided".into())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            Self::Multipart(error) => {
                tracing::warn!(error = %error, "Failed to read multipart body");
                error_response(
                    error.status(),
                    format!("Failed to read multipart: {}", error.body_text()),
                )
            }
            Self::Upload(UploadError::Invalid(errors)) => validation_response(errors),
            Self::Upload(error) => {
                match &error {
                    UploadError::Unreadable { id, source } => {
                        tracing::error!(id, error = %source, "Error reading file content");
                    }
                    _ => tracing::error!(error = %error, "Upload failed"),
                }
                error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            Self::Chat(error) if error.is_client_error() => {
                tracing::warn!(error = %error, "Rejected chat request");
                error_response(StatusCode::BAD_REQUEST, error.to_string())
            }
            Self::Chat(error) => {
                tracing::error!(error = %error, "Error processing chatbot query");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        }
    }
}

fn validation_response(errors: ValidationErrors) -> Response {
    tracing::warn!(errors = %errors, "Upload failed validation");
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}

impl From<UploadError> for AppError {
    fn from(inner: UploadError) -> Self {
        Self::Upload(inner)
    }
}

impl From<ChatError> for AppError {
    fn from(inner: ChatError) -> Self {
        Self::Chat(inner)
    }
}
