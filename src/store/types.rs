//! Record and error types for the upload store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;

/// Metadata describing one stored upload.
///
/// Records are written once and never updated; `id` grows with every save, so the highest id is
/// the most recent upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Sequential identifier assigned by the store.
    pub id: u64,
    /// Blob location relative to the media root, e.g. `uploads/<uuid>-notes.txt`.
    pub file: String,
    /// File name supplied by the client (final path component only).
    pub original_name: String,
    /// Payload length in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the payload.
    pub sha256: String,
    /// Creation time in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

/// Field-level validation failures, keyed by field name.
///
/// Serializes as `{"file": ["The submitted file is empty."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Build an error set holding a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Append a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised by [`crate::store::FileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Upload rejected before anything was written.
    #[error("Invalid upload: {0}")]
    Validation(#[from] ValidationErrors),
    /// Filesystem failure while writing blobs or the index.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be encoded for the index.
    #[error("Failed to encode upload record: {0}")]
    Encode(#[from] serde_json::Error),
    /// The metadata index contains a line that is not a valid record.
    #[error("Corrupt upload index at line {line}: {source}")]
    CorruptIndex {
        /// One-based line number inside the index file.
        line: usize,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}
