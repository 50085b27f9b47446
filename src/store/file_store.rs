//! Filesystem-backed upload store with an append-only JSON-lines index.

use super::sanitize::{storage_name, validate_upload};
use super::types::{StoreError, UploadedFile};
use sha2::{Digest, Sha256};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

const UPLOAD_DIR: &str = "uploads";
const INDEX_FILE: &str = "uploads.jsonl";

/// Persists uploaded payloads under a media root and tracks the most recent one.
///
/// Blobs live in `<root>/uploads/`, metadata in `<root>/uploads.jsonl` with one record per line.
/// There is no per-user scoping: every caller shares the same "latest" upload.
pub struct FileStore {
    root: PathBuf,
    state: Mutex<IndexState>,
}

struct IndexState {
    next_id: u64,
    latest: Option<UploadedFile>,
}

impl FileStore {
    /// Open (or initialize) a store rooted at `root`, loading any existing index.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(UPLOAD_DIR)).await?;

        let index_path = root.join(INDEX_FILE);
        let latest = match fs::read(&index_path).await {
            Ok(contents) => latest_from_index(complete_lines(&index_path, &contents).await?)?,
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        let next_id = latest.as_ref().map_or(1, |record| record.id + 1);
        tracing::debug!(
            root = %root.display(),
            latest_id = ?latest.as_ref().map(|record| record.id),
            "Opened upload store"
        );

        Ok(Self {
            root,
            state: Mutex::new(IndexState { next_id, latest }),
        })
    }

    /// Validate and persist a payload, returning its new record.
    ///
    /// Validation failures leave no trace on disk. The blob is written before the index line, so
    /// a crash in between can orphan a blob but never produce a record without one.
    pub async fn save(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> Result<UploadedFile, StoreError> {
        let original_name = validate_upload(bytes, original_name)?;
        let file = format!(
            "{UPLOAD_DIR}/{}-{}",
            Uuid::new_v4(),
            storage_name(&original_name)
        );
        fs::write(self.root.join(&file), bytes).await?;

        let mut state = self.state.lock().await;
        let record = UploadedFile {
            id: state.next_id,
            file,
            original_name,
            size: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(bytes)),
            uploaded_at: OffsetDateTime::now_utc(),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(INDEX_FILE))
            .await?;
        index.write_all(line.as_bytes()).await?;
        index.flush().await?;

        state.next_id += 1;
        state.latest = Some(record.clone());
        tracing::info!(
            id = record.id,
            file = %record.file,
            size = record.size,
            "Stored upload"
        );
        Ok(record)
    }

    /// Most recently created record, if any upload has happened.
    ///
    /// Reads are not coordinated with concurrent uploads: a query racing an upload may observe
    /// either the previous or the new record.
    pub async fn latest(&self) -> Option<UploadedFile> {
        self.state.lock().await.latest.clone()
    }

    /// Absolute location of a record's blob.
    pub fn path_of(&self, record: &UploadedFile) -> PathBuf {
        self.root.join(&record.file)
    }
}

/// Newline-terminated prefix of the index.
///
/// Every record is appended together with its newline, so an unterminated tail is an interrupted
/// append. It is truncated away so later appends start on a fresh line.
async fn complete_lines<'a>(path: &Path, contents: &'a [u8]) -> Result<&'a str, StoreError> {
    let complete_len = contents
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |idx| idx + 1);
    if complete_len < contents.len() {
        tracing::warn!(
            index = %path.display(),
            dropped_bytes = contents.len() - complete_len,
            "Discarding partial index line"
        );
        let index = OpenOptions::new().write(true).open(path).await?;
        index.set_len(complete_len as u64).await?;
    }
    std::str::from_utf8(&contents[..complete_len])
        .map_err(|err| StoreError::from(io::Error::new(ErrorKind::InvalidData, err)))
}

fn latest_from_index(contents: &str) -> Result<Option<UploadedFile>, StoreError> {
    let mut latest: Option<UploadedFile> = None;
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: UploadedFile = serde_json::from_str(line)
            .map_err(|source| StoreError::CorruptIndex {
                line: idx + 1,
                source,
            })?;
        if latest.as_ref().is_none_or(|current| record.id > current.id) {
            latest = Some(record);
        }
    }
    Ok(latest)
}
