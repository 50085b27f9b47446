//! Upload and question flows behind the HTTP handlers.

mod service;
pub mod types;

pub use service::{DocumentApi, DocumentService, preview};
pub use types::{
    ChatAnswer, ChatError, FIXED_CONFIDENCE, PREVIEW_CHARS, UploadError, UploadOutcome,
};
