//! Outcomes and error kinds for the upload and question flows.

use crate::extraction::ExtractionError;
use crate::inference::InferenceError;
use crate::store::{StoreError, UploadedFile, ValidationErrors};
use thiserror::Error;

/// Number of characters returned as an upload preview.
pub const PREVIEW_CHARS: usize = 10_000;

/// Placeholder confidence attached to every answer; not derived from any signal.
pub const FIXED_CONFIDENCE: u8 = 85;

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Stored record for the new upload.
    pub record: UploadedFile,
    /// First [`PREVIEW_CHARS`] characters of the extracted text.
    pub preview: String,
}

/// Answer produced for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    /// Model output, unmodified.
    pub response: String,
    /// Always [`FIXED_CONFIDENCE`].
    pub confidence: u8,
}

/// Failures of the upload flow.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Payload or name rejected; nothing was stored.
    #[error("{0}")]
    Invalid(ValidationErrors),
    /// Writing the blob or its record failed.
    #[error(transparent)]
    Storage(StoreError),
    /// The upload was stored but its text could not be extracted.
    ///
    /// The record is not rolled back and remains the latest upload.
    #[error("Failed to read file content")]
    Unreadable {
        /// Identifier of the record that stays persisted.
        id: u64,
        /// Extraction failure.
        #[source]
        source: ExtractionError,
    },
}

impl From<StoreError> for UploadError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Validation(errors) => Self::Invalid(errors),
            other => Self::Storage(other),
        }
    }
}

/// Failures of the question flow, one variant per guard.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message was missing or empty.
    #[error("Message cannot be empty")]
    EmptyMessage,
    /// Nothing has been uploaded yet.
    #[error("No file has been uploaded yet")]
    NoFileUploaded,
    /// The latest upload is neither a PDF nor a plain-text file.
    #[error("Unsupported file format. Please upload a PDF or text file.")]
    UnsupportedFormat,
    /// Extraction succeeded but produced only whitespace.
    #[error("File content is empty after extraction")]
    EmptyContent,
    /// The latest upload could not be read or decoded.
    #[error(transparent)]
    Extraction(ExtractionError),
    /// The model call failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ChatError {
    /// Whether the failure is caused by the request or prior uploads rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyMessage | Self::NoFileUploaded | Self::UnsupportedFormat | Self::EmptyContent
        )
    }
}

impl From<ExtractionError> for ChatError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::UnsupportedFormat(_) => Self::UnsupportedFormat,
            other => Self::Extraction(other),
        }
    }
}
