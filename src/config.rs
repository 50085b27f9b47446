use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_CHAT_MODEL: &str = "deepseek-r1:1.5b";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docchat server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding uploaded blobs and the metadata index.
    pub media_root: PathBuf,
    /// Base URL of the Ollama runtime answering chat requests.
    pub ollama_url: String,
    /// Model identifier passed to Ollama for every query.
    pub chat_model: String,
    /// Optional request timeout for inference calls; `None` waits indefinitely.
    pub inference_timeout_secs: Option<u64>,
    /// Maximum accepted size of an upload request body.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            media_root: load_env_optional("MEDIA_ROOT")
                .unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string())
                .into(),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            chat_model: load_env_optional("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            inference_timeout_secs: parse_optional("INFERENCE_TIMEOUT_SECS")?,
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Calling this more than once keeps the first configuration.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        media_root = %config.media_root.display(),
        ollama_url = %config.ollama_url,
        chat_model = %config.chat_model,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
