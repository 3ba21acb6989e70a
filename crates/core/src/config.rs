//! Configuration management for Notebook.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.notebook/config.yaml` or `--config`)
//! - Environment variables (`NOTEBOOK_*`)
//! - Command-line flags
//!
//! The configuration is workspace-centric: the index, document folders and
//! prompt overrides all live under `.notebook/` unless configured otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Providers understood by the knowledge crate.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .notebook/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Model/embedding backend ("ollama" or "mock")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Ollama connection settings
    pub ollama: OllamaSettings,

    /// On-disk locations
    pub storage: StorageSettings,

    /// Chunking and retrieval tuning
    pub rag: RagSettings,

    /// Web search enrichment
    pub web_search: WebSearchSettings,

    /// Use the three-phase deep-think synthesis prompt
    pub deep_think: bool,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,
}

/// Ollama endpoint and model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OllamaSettings {
    pub base_url: String,
    pub embedding_model: String,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "mxbai-embed-large".to_string(),
            request_timeout: 180,
        }
    }
}

/// Workspace-relative storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    pub index_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub prompts_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(".notebook/index"),
            docs_dir: PathBuf::from(".notebook/docs"),
            upload_dir: PathBuf::from(".notebook/uploads"),
            prompts_dir: PathBuf::from(".notebook/prompts"),
        }
    }
}

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RagSettings {
    /// Target chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
    /// Unique chunks that make it into the final context
    pub chunk_k: usize,
    /// Chunks fetched per (sub-)query before deduplication
    pub search_k_per_query: usize,
    /// Model-generated sub-queries (0 disables expansion)
    pub multi_query_count: usize,
    /// Max characters of document text sent for analysis
    pub analysis_max_context_length: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            chunk_k: 5,
            search_k_per_query: 3,
            multi_query_count: 3,
            analysis_max_context_length: 8000,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebSearchSettings {
    pub enabled: bool,
    pub max_results: usize,
    /// Transport timeout in seconds
    pub timeout: u64,
    pub region: String,
    /// Cache entry lifetime in seconds
    pub cache_ttl: u64,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: 3,
            timeout: 10,
            region: "wt-wt".to_string(),
            cache_ttl: 3600,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    deep_think: Option<bool>,
    ollama: Option<OllamaSettings>,
    storage: Option<StorageSettings>,
    rag: Option<RagSettings>,
    web_search: Option<WebSearchSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "deepseek-r1:1.5b".to_string(),
            ollama: OllamaSettings::default(),
            storage: StorageSettings::default(),
            rag: RagSettings::default(),
            web_search: WebSearchSettings::default(),
            deep_think: true,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// # Example
    /// ```no_run
    /// use notebook_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {:?}", config.index_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit workspace/config paths win over
    /// `NOTEBOOK_WORKSPACE` / `NOTEBOOK_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("NOTEBOOK_WORKSPACE")) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env_path("NOTEBOOK_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.notebook_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env(|name| std::env::var(name).ok())?;

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level.get_or_insert(level);
        }
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        self.merge_file(file);
        Ok(())
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(deep_think) = file.deep_think {
            self.deep_think = deep_think;
        }
        if let Some(ollama) = file.ollama {
            self.ollama = ollama;
        }
        if let Some(storage) = file.storage {
            self.storage = storage;
        }
        if let Some(rag) = file.rag {
            self.rag = rag;
        }
        if let Some(web_search) = file.web_search {
            self.web_search = web_search;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }
    }

    /// Apply `NOTEBOOK_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NOTEBOOK_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("NOTEBOOK_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("NOTEBOOK_OLLAMA_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = lookup("NOTEBOOK_EMBED_MODEL") {
            self.ollama.embedding_model = v;
        }
        parse_into(&lookup, "NOTEBOOK_REQUEST_TIMEOUT", &mut self.ollama.request_timeout)?;

        if let Some(v) = lookup("NOTEBOOK_INDEX_DIR") {
            self.storage.index_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("NOTEBOOK_DOCS_DIR") {
            self.storage.docs_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("NOTEBOOK_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("NOTEBOOK_PROMPTS_DIR") {
            self.storage.prompts_dir = PathBuf::from(v);
        }

        parse_into(&lookup, "NOTEBOOK_CHUNK_SIZE", &mut self.rag.chunk_size)?;
        parse_into(&lookup, "NOTEBOOK_CHUNK_OVERLAP", &mut self.rag.chunk_overlap)?;
        parse_into(&lookup, "NOTEBOOK_RAG_CHUNK_K", &mut self.rag.chunk_k)?;
        parse_into(
            &lookup,
            "NOTEBOOK_RAG_SEARCH_K_PER_QUERY",
            &mut self.rag.search_k_per_query,
        )?;
        parse_into(&lookup, "NOTEBOOK_MULTI_QUERY_COUNT", &mut self.rag.multi_query_count)?;
        parse_into(
            &lookup,
            "NOTEBOOK_ANALYSIS_MAX_CONTEXT_LENGTH",
            &mut self.rag.analysis_max_context_length,
        )?;

        parse_bool_into(&lookup, "NOTEBOOK_WEB_SEARCH_ENABLED", &mut self.web_search.enabled)?;
        parse_into(&lookup, "NOTEBOOK_WEB_SEARCH_MAX_RESULTS", &mut self.web_search.max_results)?;
        parse_into(&lookup, "NOTEBOOK_WEB_SEARCH_TIMEOUT", &mut self.web_search.timeout)?;
        if let Some(v) = lookup("NOTEBOOK_WEB_SEARCH_REGION") {
            self.web_search.region = v;
        }
        parse_into(&lookup, "NOTEBOOK_WEB_SEARCH_CACHE_TTL", &mut self.web_search.cache_ttl)?;

        parse_bool_into(&lookup, "NOTEBOOK_DEEP_THINK", &mut self.deep_think)?;

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
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

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .notebook directory.
    pub fn notebook_dir(&self) -> PathBuf {
        self.workspace.join(".notebook")
    }

    /// Ensure the .notebook directory exists.
    pub fn ensure_notebook_dir(&self) -> AppResult<()> {
        let dir = self.notebook_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .notebook directory: {}", e))
            })?;
        }
        Ok(())
    }

    pub fn index_dir(&self) -> PathBuf {
        self.resolve(&self.storage.index_dir)
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.resolve(&self.storage.docs_dir)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.resolve(&self.storage.upload_dir)
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.resolve(&self.storage.prompts_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider == "ollama"
            && !(self.ollama.base_url.starts_with("http://")
                || self.ollama.base_url.starts_with("https://"))
        {
            return Err(AppError::Config(format!(
                "Ollama base URL must be http(s): {}",
                self.ollama.base_url
            )));
        }

        if self.rag.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }

        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }

        if self.rag.chunk_k == 0 {
            return Err(AppError::Config("chunkK must be at least 1".to_string()));
        }

        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

fn parse_into<F, T>(lookup: &F, name: &str, target: &mut T) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *target = raw.trim().parse().map_err(|e: T::Err| {
            AppError::Config(format!("Invalid value for {}: '{}' ({})", name, raw, e))
        })?;
    }
    Ok(())
}

fn parse_bool_into<F>(lookup: &F, name: &str, target: &mut bool) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *target = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(AppError::Config(format!(
                    "Invalid boolean for {}: '{}'",
                    name, raw
                )))
            }
        };
    }
    Ok(())
}
