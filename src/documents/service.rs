//! Document service wiring storage, extraction, and inference together.

use crate::{
    documents::types::{
        ChatAnswer, ChatError, FIXED_CONFIDENCE, PREVIEW_CHARS, UploadError, UploadOutcome,
    },
    extraction::extract_text,
    inference::{ChatRequest, InferenceClient},
    prompt::build_messages,
    store::FileStore,
};
use async_trait::async_trait;

/// Operations exposed to the HTTP surface.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Store a payload and return its record plus a text preview.
    async fn upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> Result<UploadOutcome, UploadError>;

    /// Answer `message` using the most recent upload as context.
    async fn ask(&self, message: &str, detailed: bool) -> Result<ChatAnswer, ChatError>;
}

/// Default [`DocumentApi`] implementation.
///
/// Construct once at startup and share through an `Arc`. Every question re-reads the latest
/// upload from disk; nothing is cached between calls.
pub struct DocumentService {
    store: FileStore,
    inference: Box<dyn InferenceClient>,
    chat_model: String,
}

impl DocumentService {
    /// Build a service from its collaborators.
    pub fn new(
        store: FileStore,
        inference: Box<dyn InferenceClient>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            inference,
            chat_model: chat_model.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &FileStore {
        &self.store
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> Result<UploadOutcome, UploadError> {
        let record = self.store.save(bytes, original_name).await?;
        let path = self.store.path_of(&record);
        let text = extract_text(&path)
            .await
            .map_err(|source| UploadError::Unreadable {
                id: record.id,
                source,
            })?;

        Ok(UploadOutcome {
            preview: preview(&text),
            record,
        })
    }

    async fn ask(&self, message: &str, detailed: bool) -> Result<ChatAnswer, ChatError> {
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let record = self
            .store
            .latest()
            .await
            .ok_or(ChatError::NoFileUploaded)?;
        let text = extract_text(&self.store.path_of(&record)).await?;
        if text.trim().is_empty() {
            return Err(ChatError::EmptyContent);
        }

        tracing::info!(
            id = record.id,
            detailed,
            document_chars = text.chars().count(),
            model = %self.chat_model,
            "Answering question"
        );
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: build_messages(&text, message, detailed),
        };
        let response = self.inference.chat(request).await?;

        Ok(ChatAnswer {
            response,
            confidence: FIXED_CONFIDENCE,
        })
    }
}

/// Truncate `text` to at most [`PREVIEW_CHARS`] characters without splitting a code point.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
