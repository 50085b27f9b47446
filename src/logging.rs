//! Tracing configuration and log routing.
//!
//! Logs go to stdout using a compact formatter and to a file. When `DOCCHAT_LOG_FILE` is set,
//! logs are appended to that path; otherwise a file logger is created under `logs/docchat.log`.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "docchat.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when available, a file layer.
/// - Keeps the non-blocking writer guard alive for the process lifetime.
///
/// Call once per process; a second call panics inside `tracing-subscriber`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Resolve where file logs should be written.
///
/// `DOCCHAT_LOG_FILE` wins when set; otherwise logs land in `logs/docchat.log`, creating the
/// directory on demand.
fn log_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("DOCCHAT_LOG_FILE") {
        return Some(PathBuf::from(path));
    }
    let dir = Path::new(DEFAULT_LOG_DIR);
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create logs directory: {err}");
        return None;
    }
    Some(dir.join(DEFAULT_LOG_FILE))
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when the target file cannot be opened.
fn configure_file_writer() -> Option<NonBlocking> {
    let path = log_file_path()?;
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            return None;
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
