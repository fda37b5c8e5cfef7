//! Configuration loading.
//!
//! Priority for every key: CLI flag / env var (resolved by clap) >
//! `{config_dir}/config.toml` > built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::QRadarError;

pub const DEFAULT_API_VERSION: &str = "15.0";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_LOG_DIRECTIVE: &str = "qradar_mcp=info";

/// Log filter from a `RUST_LOG` value. An unset, blank or unparsable value
/// falls back to `qradar_mcp=info`.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub chat: ChatFileConfig,
}

/// `[chat]` table of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatFileConfig {
    #[serde(default)]
    pub ollama_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub api_token: Option<String>,
    pub verify_ssl: Option<bool>,
    pub api_version: Option<String>,
}

/// Resolve the configuration directory.
///
/// Explicit path (flag or `QRADAR_MCP_HOME`) > `~/.qradar-mcp` > `./.qradar-mcp`.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".qradar-mcp"))
            .unwrap_or_else(|| PathBuf::from(".qradar-mcp"))
    })
}

/// Load `{config_dir}/config.toml`, falling back to an empty file config.
pub fn load_config_file(config_dir: &Path) -> ConfigFile {
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                "Failed to read {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            ConfigFile::default()
        }
    }
}

/// Connection settings for the QRadar console.
#[derive(Debug, Clone)]
pub struct QRadarConfig {
    /// Console hostname or URL, without the `/api` suffix.
    pub host: String,
    /// Authorized service token, sent as the `SEC` header.
    pub api_token: String,
    pub verify_ssl: bool,
    /// Value of the `Version` header.
    pub api_version: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: u32,
}

impl QRadarConfig {
    pub fn new(host: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_token: api_token.into(),
            verify_ssl: true,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Merge overrides on top of the file config. Host and token are required.
    pub fn resolve(overrides: &ConfigOverrides, file: &ConfigFile) -> Result<Self, QRadarError> {
        let host = overrides
            .host
            .clone()
            .or_else(|| file.host.clone())
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                QRadarError::Config("QRADAR_HOST must be set (flag, env or config.toml)".into())
            })?;
        let api_token = overrides
            .api_token
            .clone()
            .or_else(|| file.api_token.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                QRadarError::Config(
                    "QRADAR_API_TOKEN must be set (flag, env or config.toml)".into(),
                )
            })?;

        let mut config = Self::new(host, api_token);
        if let Some(verify) = overrides.verify_ssl.or(file.verify_ssl) {
            config.verify_ssl = verify;
        }
        if let Some(version) = overrides.api_version.clone().or(file.api_version.clone()) {
            config.api_version = version;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = file.max_retries {
            config.max_retries = retries;
        }
        Ok(config)
    }

    /// `https://{host}/api`, keeping an explicit scheme if one was given.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        let host = host.strip_suffix("/api").unwrap_or(host);
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api", host)
        } else {
            format!("https://{}/api", host)
        }
    }
}

/// Settings for the local chat model.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub ollama_url: String,
    pub model: String,
    pub temperature: f32,
    pub num_ctx: u32,
    pub request_timeout: Duration,
    /// Messages kept per session (user + assistant turns).
    pub history_limit: usize,
    /// Upper bound on model → tool → model round trips per message.
    pub max_tool_rounds: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            num_ctx: 4096,
            request_timeout: Duration::from_secs(120),
            history_limit: 20,
            max_tool_rounds: 5,
        }
    }
}

impl ChatConfig {
    pub fn resolve(ollama_url: Option<String>, model: Option<String>, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            ollama_url: ollama_url
                .or_else(|| file.chat.ollama_url.clone())
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ollama_url.clone()),
            model: model
                .or_else(|| file.chat.model.clone())
                .unwrap_or(defaults.model.clone()),
            ..defaults
        }
    }
}
