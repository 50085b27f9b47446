//! Full-text extraction for stored uploads, dispatched on file extension.
//!
//! PDFs are parsed with `lopdf` page by page; `.txt`, `.md` and `.csv` files are read verbatim as
//! UTF-8. No chunking or size limits are applied here.

use lopdf::Document;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while turning a stored file into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file extension is not `.pdf`, `.txt`, `.md` or `.csv`.
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedFormat(String),
    /// The PDF could not be opened or a page could not be decoded.
    #[error("Error reading PDF: {0}")]
    Pdf(String),
    /// The file could not be read from disk.
    #[error("Error reading file: {0}")]
    Read(#[source] std::io::Error),
    /// A plain-text file contained bytes that are not valid UTF-8.
    #[error("Error reading file: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Document families the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Paginated PDF document.
    Pdf,
    /// UTF-8 text (`.txt`, `.md`, `.csv`).
    PlainText,
}

impl DocumentFormat {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "md" | "csv" => Ok(Self::PlainText),
            _ => Err(ExtractionError::UnsupportedFormat(extension)),
        }
    }
}

/// Return the full text of the file at `path`.
///
/// PDF parsing is CPU bound and runs on the blocking pool; the parsed document is dropped before
/// the task finishes, whether extraction succeeded or not.
pub async fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Pdf => {
            let owned: PathBuf = path.to_path_buf();
            tokio::task::spawn_blocking(move || extract_pdf(&owned))
                .await
                .map_err(|err| ExtractionError::Pdf(format!("extraction task failed: {err}")))?
        }
        DocumentFormat::PlainText => {
            let bytes = tokio::fs::read(path).await.map_err(ExtractionError::Read)?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    let document = Document::load(path).map_err(|err| ExtractionError::Pdf(err.to_string()))?;
    let pages = document
        .get_pages()
        .into_keys()
        .map(|page_number| {
            document.extract_text(&[page_number]).map_err(|err| {
                ExtractionError::Pdf(format!("page {page_number}: {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");
    Ok(join_pages(pages))
}

/// Concatenate page texts in order, terminating each with a newline.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages.into_iter().fold(String::new(), |mut text, page| {
        text.push_str(page.as_ref());
        text.push('\n');
        text
    })
}
