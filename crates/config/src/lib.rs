//! Configuration loading, validation, and management for SupportDesk.
//!
//! Loads configuration from `~/.supportdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.supportdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat-completion gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible gateway (without `/chat/completions`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model requested from the gateway
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Document retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation history window
    #[serde(default)]
    pub history: HistoryConfig,

    /// Session storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// How replies are produced
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_api_url() -> String {
    "https://ai.gateway.lovable.dev/v1".into()
}
fn default_model() -> String {
    "google/gemini-3-flash-preview".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    500
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retrieval", &self.retrieval)
            .field("history", &self.history)
            .field("storage", &self.storage)
            .field("gateway", &self.gateway)
            .field("assistant", &self.assistant)
            .finish()
    }
}

/// How strictly the assistant sticks to the documentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerPolicy {
    /// Answer only from the supplied documentation, otherwise the fallback sentence
    #[default]
    Strict,
    /// Prefer the documentation, fall back to general knowledge
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// How many documents go into the prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub policy: AnswerPolicy,

    #[serde(default)]
    pub weights: WeightsConfig,

    /// JSON file replacing the built-in product catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_path: Option<String>,
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            policy: AnswerPolicy::default(),
            weights: WeightsConfig::default(),
            docs_path: None,
        }
    }
}

/// Points awarded by the relevance scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Per keyword found inside the query
    #[serde(default = "default_keyword_weight")]
    pub keyword: u32,

    /// Per (query word, keyword) pair where one contains the other
    #[serde(default = "default_word_overlap_weight")]
    pub word_overlap: u32,

    /// When the whole title appears in the query
    #[serde(default = "default_title_weight")]
    pub title: u32,

    /// Per title word equal to a query word (0 disables)
    #[serde(default = "default_title_word_weight")]
    pub title_word: u32,
}

fn default_keyword_weight() -> u32 {
    3
}
fn default_word_overlap_weight() -> u32 {
    1
}
fn default_title_weight() -> u32 {
    4
}
fn default_title_word_weight() -> u32 {
    2
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            keyword: default_keyword_weight(),
            word_overlap: default_word_overlap_weight(),
            title: default_title_weight(),
            title_word: default_title_word_weight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of user+assistant pairs sent to the model
    #[serde(default = "default_history_pairs")]
    pub pairs: usize,
}

fn default_history_pairs() -> usize {
    5
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            pairs: default_history_pairs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// SQLite file path; defaults to `~/.supportdesk/support.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_storage_backend() -> String {
    "sqlite".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. Empty = any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: vec![],
        }
    }
}

/// Where replies come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantMode {
    /// Ask the language model gateway
    #[default]
    Model,
    /// Answer straight from the documentation, no network
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub mode: AssistantMode,

    /// Stream replies in the CLI by default
    #[serde(default = "default_true")]
    pub stream: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            mode: AssistantMode::default(),
            stream: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.supportdesk/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SUPPORTDESK_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `SUPPORTDESK_MODEL`
    /// - `SUPPORTDESK_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Like [`AppConfig::load`], reading `path` instead of the default file.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("SUPPORTDESK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("SUPPORTDESK_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("SUPPORTDESK_API_URL") {
            config.api_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".supportdesk")
    }

    /// The default config file, `~/.supportdesk/config.toml`.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Where the SQLite database lives.
    pub fn database_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(p) => PathBuf::from(p),
            None => Self::config_dir().join("support.db"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.history.pairs == 0 {
            return Err(ConfigError::ValidationError(
                "history.pairs must be at least 1".into(),
            ));
        }

        if !matches!(self.storage.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown storage backend '{}' (expected 'sqlite' or 'memory')",
                self.storage.backend
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retrieval: RetrievalConfig::default(),
            history: HistoryConfig::default(),
            storage: StorageConfig::default(),
            gateway: GatewayConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
