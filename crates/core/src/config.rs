//! Configuration management for Cropwise.
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.cropwise/config.yaml`)
//! - Environment variables (`CROPWISE_*`)
//! - Command-line flags
//!
//! All state lives under the workspace's `.cropwise/` directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the completion factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openrouter", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .cropwise/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("openrouter", "openai", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Explicit API key (overrides provider-specific env vars)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Per-provider completion settings
    pub llm: Option<LlmConfig>,

    /// Retrieval and index settings
    pub retrieval: RetrievalConfig,

    /// Embedding settings
    pub embedding: EmbeddingSettings,

    /// Query policy settings
    pub policy: PolicyConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Sampling temperature for answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// OpenAI-compatible chat completions (OpenRouter, OpenAI)
    OpenAiCompatible {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAiCompatible { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAiCompatible { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Retrieval, snapshot and completion-call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of documents retrieved per question
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Index snapshot location, relative to the workspace unless absolute
    #[serde(rename = "snapshotPath", default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Optional corpus file (JSON or YAML) replacing the built-in corpus
    #[serde(rename = "corpusPath", default)]
    pub corpus_path: Option<PathBuf>,

    /// Serve the small fallback corpus when no snapshot exists
    #[serde(rename = "allowFallbackCorpus", default)]
    pub allow_fallback_corpus: bool,

    /// Deadline for a single completion call
    #[serde(rename = "completionTimeoutSecs", default = "default_timeout_secs")]
    pub completion_timeout_secs: u64,

    /// Extra completion attempts after a recoverable failure
    #[serde(rename = "maxRetries", default)]
    pub max_retries: u32,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// "trigram" (offline) or "ollama"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Inputs longer than this are rejected, never truncated
    #[serde(rename = "maxInputChars", default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Endpoint for network embedding providers
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Query policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(rename = "restrictedTerms", default = "default_restricted_terms")]
    pub restricted_terms: Vec<String>,

    #[serde(rename = "advisoryMessage", default = "default_advisory_message")]
    pub advisory_message: String,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_k() -> usize {
    3
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(".cropwise/index.sqlite")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_embedding_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_max_input_chars() -> usize {
    8192
}

pub fn default_restricted_terms() -> Vec<String> {
    [
        "fertilizer",
        "chemical dosage",
        "pesticide amount",
        "yield prediction",
        "how much urea",
        "profit estimate",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

pub fn default_advisory_message() -> String {
    "This system provides educational explanations only.".to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            snapshot_path: default_snapshot_path(),
            corpus_path: None,
            allow_fallback_corpus: false,
            completion_timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            max_input_chars: default_max_input_chars(),
            endpoint: None,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            restricted_terms: default_restricted_terms(),
            advisory_message: default_advisory_message(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalConfig>,
    embedding: Option<EmbeddingSettings>,
    policy: Option<PolicyConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openrouter".to_string(),
            model: "openai/gpt-3.5-turbo".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingSettings::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `CROPWISE_WORKSPACE`: Override workspace path
    /// - `CROPWISE_CONFIG`: Path to config file
    /// - `CROPWISE_PROVIDER`: Completion provider
    /// - `CROPWISE_MODEL`: Completion model
    /// - `CROPWISE_API_KEY`: API key
    /// - `CROPWISE_TOP_K`: Documents per question
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit paths take precedence over `CROPWISE_WORKSPACE` and
    /// `CROPWISE_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let env_path = |name: &str| std::env::var(name).ok().map(PathBuf::from);

        if let Some(workspace) = workspace.or_else(|| env_path("CROPWISE_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("CROPWISE_CONFIG"));

        config.load_from_workspace()?;

        if let Ok(top_k) = std::env::var("CROPWISE_TOP_K") {
            config.retrieval.top_k = top_k.parse().map_err(|_| {
                AppError::Config(format!("CROPWISE_TOP_K must be a number, got '{}'", top_k))
            })?;
        }

        Ok(config)
    }

    /// Read the workspace config file (if any), then apply env overrides.
    fn load_from_workspace(&mut self) -> AppResult<()> {
        if !self.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        let config_path = match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.cropwise_dir().join("config.yaml"),
        };

        if config_path.exists() {
            *self = self.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("CROPWISE_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("CROPWISE_MODEL") {
            self.model = model;
        }

        if let Ok(key) = std::env::var("CROPWISE_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(policy) = config_file.policy {
            result.policy = policy;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the .cropwise directory.
    pub fn cropwise_dir(&self) -> PathBuf {
        self.workspace.join(".cropwise")
    }

    /// Ensure the .cropwise directory exists.
    pub fn ensure_cropwise_dir(&self) -> AppResult<()> {
        let dir = self.cropwise_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .cropwise directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Snapshot path resolved against the workspace.
    pub fn snapshot_path(&self) -> PathBuf {
        self.resolve(&self.retrieval.snapshot_path)
    }

    /// Corpus path resolved against the workspace.
    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.retrieval.corpus_path.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get a provider's configuration block, if the config file has one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Completion endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint())
            .map(|e| e.to_string())
    }

    /// Sampling temperature for answers.
    pub fn temperature(&self) -> f32 {
        self.llm
            .as_ref()
            .map(|llm| llm.temperature)
            .unwrap_or_else(default_temperature)
    }

    /// Environment variable holding the API key for a provider.
    fn api_key_env(&self, provider: &str) -> Option<String> {
        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAiCompatible { api_key_env, .. }) => {
                Some(api_key_env.clone())
            }
            Some(ProviderConfig::Ollama { .. }) => None,
            None => match provider {
                "openrouter" => Some("OPENROUTER_API_KEY".to_string()),
                "openai" => Some("OPENAI_API_KEY".to_string()),
                _ => None,
            },
        }
    }

    /// Resolve the API key for a provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.api_key_env(provider)
            .and_then(|env_var| std::env::var(env_var).ok())
            .filter(|key| !key.is_empty())
    }

    /// Validate configuration for the active provider and retrieval settings.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if self.retrieval.completion_timeout_secs == 0 {
            return Err(AppError::Config(
                "completionTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be at least 1".to_string(),
            ));
        }

        if let Some(env_var) = self.api_key_env(&self.provider) {
            if self.resolve_api_key(&self.provider).is_none() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        Ok(())
    }
}
