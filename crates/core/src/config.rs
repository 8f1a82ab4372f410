//! Configuration management for the RAG API service.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`rag.yaml`, or the path in `RAG_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the completion factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persistent document store
    pub data_dir: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Socket address the HTTP server binds to
    pub bind: String,

    /// Completion provider ("openai" or "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Custom completion endpoint
    pub endpoint: Option<String>,

    /// Explicit API key (`RAG_API_KEY`)
    pub api_key: Option<String>,

    /// Completion request timeout in seconds
    pub timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Retrieval and gating settings
    pub retrieval: RetrievalConfig,

    /// Embedding settings for the document store
    pub embedding: EmbeddingSettings,

    /// Directory with prompt overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Per-provider completion settings from the config file
    pub llm: Option<LlmConfig>,
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Store collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Candidates requested from the store per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Best-match distance must be strictly below this to ground an answer
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,
}

fn default_collection() -> String {
    "docs".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_distance_threshold() -> f32 {
    0.9
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            top_k: default_top_k(),
            distance_threshold: default_distance_threshold(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Vector dimensions
    pub dimensions: usize,

    /// Provider endpoint (ollama only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// LLM configuration from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific completion settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(rename = "apiKeyEnv", default)]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerSection>,
    store: Option<StoreSection>,
    retrieval: Option<RetrievalConfig>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmConfig>,
    prompts: Option<PromptsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreSection {
    #[serde(rename = "dataDir")]
    data_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptsSection {
    dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db"),
            config_file: None,
            bind: "0.0.0.0:8000".to_string(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingSettings::default(),
            prompts_dir: None,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// The config file is `config_file` if given, else `RAG_CONFIG`, else
    /// `./rag.yaml` when it exists. An explicitly named file that is missing
    /// is an error.
    ///
    /// Environment variables (override the file):
    /// - `RAG_BIND`: HTTP bind address
    /// - `RAG_DATA_DIR`: Store directory
    /// - `RAG_PROVIDER`: Completion provider
    /// - `RAG_MODEL`: Completion model
    /// - `RAG_LLM_ENDPOINT`: Completion endpoint
    /// - `RAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use rag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Store: {:?}", config.data_dir);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("RAG_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from("rag.yaml");
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        if let Ok(bind) = std::env::var("RAG_BIND") {
            config.bind = bind;
        }

        if let Ok(data_dir) = std::env::var("RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(provider) = std::env::var("RAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("RAG_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("RAG_LLM_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(key) = std::env::var("RAG_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(bind) = config_file.server.and_then(|s| s.bind) {
            result.bind = bind;
        }

        if let Some(dir) = config_file.store.and_then(|s| s.data_dir) {
            result.data_dir = PathBuf::from(dir);
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(dir) = config_file.prompts.and_then(|p| p.dir) {
            result.prompts_dir = Some(PathBuf::from(dir));
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                if let Some(ref model) = provider_config.model {
                    result.model = model.clone();
                }
                if let Some(ref endpoint) = provider_config.endpoint {
                    result.endpoint = Some(endpoint.clone());
                }
                if let Some(timeout) = provider_config.timeout {
                    result.timeout_secs = timeout;
                }
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
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
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Ensure the store directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {:?}: {}",
                    self.data_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Get the config-file settings for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: `RAG_API_KEY`, then the variable named by the provider's
    /// `apiKeyEnv`, then the provider's conventional variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = self
            .get_provider_config(provider)
            .and_then(|p| p.api_key_env.clone())
            .or_else(|| default_api_key_env(provider).map(str::to_string))?;

        std::env::var(env_var).ok().filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration before serving.
    ///
    /// A hosted provider without a credential is fatal.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider_requires_api_key(&provider) && self.resolve_api_key(&provider).is_none() {
            let env_var = self
                .get_provider_config(&provider)
                .and_then(|p| p.api_key_env.clone())
                .or_else(|| default_api_key_env(&provider).map(str::to_string))
                .unwrap_or_else(|| "RAG_API_KEY".to_string());
            return Err(AppError::Config(format!(
                "API key not found: set RAG_API_KEY or {}",
                env_var
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        let threshold = self.retrieval.distance_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AppError::Config(format!(
                "retrieval.distanceThreshold must be a positive number, got {}",
                threshold
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Whether a provider is a hosted service that needs a credential.
pub fn provider_requires_api_key(provider: &str) -> bool {
    matches!(provider, "openai")
}

/// Conventional API key variable for a provider.
fn default_api_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}
