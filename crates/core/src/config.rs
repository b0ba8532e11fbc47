//! Configuration management for Coursewise.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.coursewise/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with the index and prompts stored in `.coursewise/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "claude", "anthropic"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .coursewise/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Reasoning engine provider ("ollama", "claude")
    pub provider: String,

    /// Reasoning engine model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Retrieval and orchestration settings
    pub rag: RagConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Claude {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "apiVersion")]
        api_version: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Claude { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint configured for this provider, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Claude { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Where the semantic index lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// LanceDB tables under `.coursewise/index`
    #[serde(alias = "lance")]
    LanceDb,

    /// Process-local index, lost on exit
    Memory,
}

/// Embedding model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom endpoint for HTTP-backed providers
    #[serde(skip_serializing_if = "Option::is_none")]
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

/// Retrieval and orchestration settings (`rag:` section of config.yaml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RagConfig {
    /// Maximum catalog distance accepted when resolving a course name.
    ///
    /// Calibrated for sentence-transformer embeddings (all-MiniLM family):
    ///
    /// | query vs. stored title | distance |
    /// |------------------------|----------|
    /// | exact title            | ~0.0     |
    /// | close paraphrase       | 0.2-0.5  |
    /// | single keyword/acronym | ~1.5     |
    /// | unrelated text         | 1.8+     |
    ///
    /// Re-derive this table whenever the embedding model or corpus changes.
    pub similarity_threshold: f32,

    /// Number of content chunks returned per search
    pub max_results: usize,

    /// Number of exchanges (user + assistant pairs) kept per session
    pub max_history: usize,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Overlap between neighbouring chunks in characters
    pub chunk_overlap: usize,

    /// Maximum tokens per reasoning engine call
    pub max_tokens: u32,

    /// Sampling temperature for the reasoning engine
    pub temperature: f32,

    /// Index storage backend
    pub index_backend: IndexBackend,

    /// Folder holding course documents, relative to the workspace
    pub docs_path: PathBuf,

    /// Embedding model settings
    pub embedding: EmbeddingSettings,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 1.6,
            max_results: 5,
            max_history: 2,
            chunk_size: 800,
            chunk_overlap: 100,
            max_tokens: 800,
            temperature: 0.0,
            index_backend: IndexBackend::LanceDb,
            docs_path: PathBuf::from("docs"),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl RagConfig {
    /// Check value ranges that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.similarity_threshold > 0.0) {
            return Err(AppError::Config(format!(
                "similarityThreshold must be positive, got {}",
                self.similarity_threshold
            )));
        }
        if self.max_results == 0 {
            return Err(AppError::Config("maxResults must be at least 1".to_string()));
        }
        if self.max_history == 0 {
            return Err(AppError::Config("maxHistory must be at least 1".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
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

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    rag: Option<RagConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
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
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            rag: RagConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `COURSEWISE_WORKSPACE`: Override workspace path
    /// - `COURSEWISE_CONFIG`: Path to config file
    /// - `COURSEWISE_PROVIDER`: Reasoning engine provider
    /// - `COURSEWISE_MODEL`: Model identifier
    /// - `COURSEWISE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use coursewise_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration for an explicit workspace and/or config file.
    ///
    /// Explicit paths win over `COURSEWISE_WORKSPACE` and `COURSEWISE_CONFIG`,
    /// so the YAML that gets merged belongs to the chosen workspace.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("COURSEWISE_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("COURSEWISE_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.coursewise_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("COURSEWISE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("COURSEWISE_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("COURSEWISE_API_KEY").ok();
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

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
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
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
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

    /// Get the path to the .coursewise directory.
    pub fn coursewise_dir(&self) -> PathBuf {
        self.workspace.join(".coursewise")
    }

    /// Ensure the .coursewise directory exists.
    pub fn ensure_coursewise_dir(&self) -> AppResult<()> {
        let dir = self.coursewise_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .coursewise directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the LanceDB tables.
    pub fn index_path(&self) -> PathBuf {
        self.coursewise_dir().join("index")
    }

    /// Course documents folder, resolved against the workspace when relative.
    pub fn docs_dir(&self) -> PathBuf {
        if self.rag.docs_path.is_absolute() {
            self.rag.docs_path.clone()
        } else {
            self.workspace.join(&self.rag.docs_path)
        }
    }

    /// Get a provider configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Custom endpoint for a provider, if configured.
    pub fn resolve_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint().map(str::to_string))
    }

    /// Resolve the API key: explicit `COURSEWISE_API_KEY` first, then the
    /// provider's `apiKeyEnv`, then `ANTHROPIC_API_KEY` for Claude.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::Claude { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(&api_key_env) {
                return Some(key);
            }
        }

        if is_claude(provider) {
            return std::env::var("ANTHROPIC_API_KEY").ok();
        }

        None
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: ollama, claude",
                self.provider
            )));
        }

        if is_claude(&provider) && self.resolve_api_key(&self.provider).is_none() {
            return Err(AppError::Config(
                "Claude provider requires an API key (COURSEWISE_API_KEY, apiKeyEnv or ANTHROPIC_API_KEY)"
                    .to_string(),
            ));
        }

        self.rag.validate()
    }
}

fn is_claude(provider: &str) -> bool {
    matches!(provider.to_lowercase().as_str(), "claude" | "anthropic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert!(!config.verbose);
        assert!(!config.no_color);
        assert_eq!(config.rag.similarity_threshold, 1.6);
        assert_eq!(config.rag.max_history, 2);
        assert_eq!(config.rag.chunk_size, 800);
        assert_eq!(config.rag.chunk_overlap, 100);
    }

    #[test]
    fn test_paths() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/tmp/ws");
        assert!(config.coursewise_dir().ends_with(".coursewise"));
        assert_eq!(config.index_path(), PathBuf::from("/tmp/ws/.coursewise/index"));
        assert_eq!(config.docs_dir(), PathBuf::from("/tmp/ws/docs"));

        config.rag.docs_path = PathBuf::from("/srv/courses");
        assert_eq!(config.docs_dir(), PathBuf::from("/srv/courses"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("claude".to_string()),
            Some("claude-sonnet-4-20250514".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "claude");
        assert_eq!(overridden.model, "claude-sonnet-4-20250514");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_load_from_explicit_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".coursewise")).unwrap();
        std::fs::write(
            temp.path().join(".coursewise/config.yaml"),
            "rag:\n  maxResults: 7\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.rag.max_results, 7);

        let missing = AppConfig::load_from(Some(temp.path().join("nope")), None);
        assert!(matches!(missing, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_yaml_rag_section() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: qwen2.5
rag:
  similarityThreshold: 0.9
  maxResults: 3
  indexBackend: memory
logging:
  level: warn
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "qwen2.5");
        assert_eq!(merged.rag.similarity_threshold, 0.9);
        assert_eq!(merged.rag.max_results, 3);
        assert_eq!(merged.rag.max_history, 2);
        assert_eq!(merged.rag.index_backend, IndexBackend::Memory);
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
        assert_eq!(
            merged.resolve_endpoint("ollama").as_deref(),
            Some("http://gpu-box:11434")
        );
    }

    #[test]
    fn test_claude_provider_config_parses() {
        let yaml = r#"
llm:
  activeProvider: claude
  providers:
    claude:
      apiKeyEnv: MY_CLAUDE_KEY
      model: claude-sonnet-4-20250514
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert!(matches!(
            merged.get_provider_config("claude"),
            Some(ProviderConfig::Claude { .. })
        ));
        assert_eq!(merged.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_claude_with_explicit_key() {
        let mut config = AppConfig::default();
        config.provider = "claude".to_string();
        config.api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rag_validation() {
        let mut rag = RagConfig::default();
        assert!(rag.validate().is_ok());

        rag.chunk_overlap = rag.chunk_size;
        assert!(rag.validate().is_err());

        let rag = RagConfig {
            similarity_threshold: 0.0,
            ..RagConfig::default()
        };
        assert!(rag.validate().is_err());

        let rag = RagConfig {
            max_history: 0,
            ..RagConfig::default()
        };
        assert!(rag.validate().is_err());
    }
}
