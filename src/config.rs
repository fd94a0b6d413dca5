/// Configuration module for vaultrag.
///
/// Settings come from three layers, later layers winning: an optional JSON
/// file, environment variables (after `.env` is loaded), then command-line
/// flags. [`Config::validate`] runs once at startup so a bad setting fails
/// before any document is read or any service is called.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RagError, Result};
use crate::index::IndexBackend;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_TRACING_API_KEY: &str = "LANGCHAIN_API_KEY";
pub const ENV_TRACING_ENABLED: &str = "LANGCHAIN_TRACING_V2";
pub const ENV_TRACING_ENDPOINT: &str = "LANGCHAIN_ENDPOINT";
pub const ENV_TRACING_PROJECT: &str = "LANGCHAIN_PROJECT";
pub const ENV_VAULT: &str = "VAULTRAG_VAULT";

// ── Default value functions ──────────────────────────────────────────

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string()]
}

fn default_chunk_size() -> usize {
    crate::chunker::DEFAULT_WINDOW
}

fn default_chunk_overlap() -> usize {
    crate::chunker::DEFAULT_OVERLAP
}

fn default_search_top_k() -> usize {
    4
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_embedding_batch_size() -> usize {
    512
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_tracing_endpoint() -> String {
    "https://api.smith.langchain.com".to_string()
}

fn default_tracing_project() -> String {
    "default".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

/// Which embedder turns text into vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    #[default]
    OpenAi,
    /// Local feature-hashing embedder; no network, no key.
    Hash,
}

impl std::str::FromStr for EmbedderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "hash" => Ok(Self::Hash),
            other => Err(RagError::config(format!(
                "unknown embedder {other:?} (expected openai or hash)"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Folder holding the notes to index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<String>,

    /// File extensions loaded from the vault.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub index_backend: IndexBackend,

    #[serde(default)]
    pub embedder: EmbedderKind,

    /// Custom prompt template file; must contain `{context}` and `{question}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<String>,

    /// Stop after retrieval and print the filled prompt instead of an answer.
    #[serde(default)]
    pub retrieve_only: bool,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(default = "default_tracing_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_tracing_project")]
    pub project: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_path: None,
            extensions: default_extensions(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_top_k: default_search_top_k(),
            temperature: 0.0,
            index_backend: IndexBackend::default(),
            embedder: EmbedderKind::default(),
            prompt_file: None,
            retrieve_only: false,
            openai: OpenAiConfig::default(),
            tracing: TracingConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            embedding_batch_size: default_embedding_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: default_tracing_endpoint(),
            project: default_tracing_project(),
        }
    }
}

impl OpenAiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Config implementation ────────────────────────────────────────────

/// Interpret a boolean environment flag.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn mask(key: Option<&String>) -> &'static str {
    match key {
        Some(k) if !k.is_empty() => "set",
        _ => "missing",
    }
}

impl Config {
    /// Load settings from a JSON file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = std::fs::read_to_string(path).map_err(|e| {
            RagError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let cfg: Config = serde_json::from_str(&data).map_err(|e| {
            RagError::config(format!("invalid JSON in {}: {e}", path.display()))
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Overlay environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = get(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = url;
        }
        if let Some(key) = get(ENV_TRACING_API_KEY) {
            self.tracing.api_key = Some(key);
        }
        if let Some(flag) = get(ENV_TRACING_ENABLED) {
            self.tracing.enabled = parse_flag(&flag);
        }
        if let Some(endpoint) = get(ENV_TRACING_ENDPOINT) {
            self.tracing.endpoint = endpoint;
        }
        if let Some(project) = get(ENV_TRACING_PROJECT) {
            self.tracing.project = project;
        }
        if let Some(vault) = get(ENV_VAULT) {
            self.vault_path = Some(vault);
        }
    }

    /// Load `.env` (existing variables win) and overlay the process environment.
    pub fn apply_process_env(&mut self) {
        dotenv::dotenv().ok();
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Whether any configured stage calls the hosted OpenAI API.
    #[must_use]
    pub fn needs_openai_key(&self) -> bool {
        self.embedder == EmbedderKind::OpenAi || !self.retrieve_only
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let ensure = |ok: bool, msg: &str| {
            if ok {
                Ok(())
            } else {
                Err(RagError::config(msg))
            }
        };

        ensure(self.vault_path.is_some(), "vault path is not set (use --vault or VAULTRAG_VAULT)")?;
        ensure(!self.extensions.is_empty(), "at least one file extension must be specified")?;
        ensure(self.chunk_size > 0, "chunk_size must be positive")?;
        ensure(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size",
        )?;
        ensure(self.search_top_k > 0, "search_top_k must be positive")?;
        ensure(
            (0.0..=2.0).contains(&self.temperature),
            "temperature must be between 0 and 2",
        )?;
        ensure(
            self.openai.embedding_dimensions > 0,
            "openai.embedding_dimensions must be positive",
        )?;
        ensure(
            self.openai.embedding_batch_size > 0,
            "openai.embedding_batch_size must be positive",
        )?;

        if self.needs_openai_key() {
            ensure(
                self.openai.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                "OPENAI_API_KEY is not set",
            )?;
        }
        if self.tracing.enabled {
            ensure(
                self.tracing.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                "LANGCHAIN_API_KEY is required when LANGCHAIN_TRACING_V2 is enabled",
            )?;
        }
        Ok(())
    }

    /// Log the effective settings. Keys are reported only as set/missing.
    pub fn log_summary(&self) {
        info!(
            "vault={} chunk_size={} overlap={} top_k={} index={:?} embedder={:?}",
            self.vault_path.as_deref().unwrap_or("-"),
            self.chunk_size,
            self.chunk_overlap,
            self.search_top_k,
            self.index_backend,
            self.embedder,
        );
        info!(
            "model={} temperature={} openai_key={} tracing={} tracing_key={}",
            self.openai.chat_model,
            self.temperature,
            mask(self.openai.api_key.as_ref()),
            self.tracing.enabled,
            mask(self.tracing.api_key.as_ref()),
        );
    }
}

// ── Tests ────────────────────────────────────────────────────────────
