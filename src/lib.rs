#![deny(missing_docs)]

//! Core library for the docchat document question-answering server.

/// HTTP routing and JSON handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Upload and question orchestration.
pub mod documents;
/// Text extraction for PDF and plain-text uploads.
pub mod extraction;
/// Chat client for the local language model.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Prompt templates sent to the model.
pub mod prompt;
/// Upload persistence.
pub mod store;
