//! Durable storage for uploaded documents.

mod file_store;
mod sanitize;
pub mod types;

pub use file_store::FileStore;
pub use sanitize::FILE_FIELD;
pub use types::{StoreError, UploadedFile, ValidationErrors};
