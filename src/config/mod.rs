//! Configuration module for mmdbrowse
//!
//! Settings live in `config.toml` under the user's config directory and can be
//! overridden per key with `MMDBROWSE__<SECTION>__<KEY>` environment variables
//! (for example `MMDBROWSE__BROWSE__SEARCH_LIMIT=200`). Every key is optional;
//! missing keys take their defaults.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MMDBROWSE";

/// Catalog browsing settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BrowseConfig {
    /// Page size a catalog view starts with
    pub default_per_page: usize,

    /// Page sizes offered by the page-size selector
    pub page_sizes: Vec<usize>,

    /// Quiet period before a typed search is issued, in milliseconds
    pub search_debounce_ms: u64,

    /// Result cap passed to every search call
    pub search_limit: usize,

    /// Abort an in-flight search when a newer query supersedes it
    pub abort_superseded_search: bool,

    /// Fetch card previews when a page is displayed
    pub preview_media: bool,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            default_per_page: 100,
            page_sizes: vec![5, 10, 50, 100, 1000, 10_000],
            search_debounce_ms: 500,
            search_limit: 1000,
            abort_superseded_search: true,
            preview_media: true,
        }
    }
}

impl BrowseConfig {
    /// Debounce period as a `Duration`
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Shared media cache settings for the local backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConfig {
    /// Seconds a resolved media file stays cached
    pub cache_ttl_secs: u64,

    /// Maximum number of cached media files
    pub cache_capacity: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            cache_capacity: 512,
        }
    }
}

/// OpenAI-compatible embeddings endpoint used for semantic search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Install the HTTP query embedder; without it search reports "unavailable"
    pub enabled: bool,

    /// API root; requests go to `<base_url>/embeddings`
    pub base_url: String,

    pub model: String,

    /// API key; takes precedence over `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-large".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// The configured key, else the value of `api_key_env`; empty keys count as unset
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `models.json`, `stages.json` and `motions.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Default `tracing` filter; `RUST_LOG` takes precedence
    pub log_filter: String,

    pub browse: BrowseConfig,

    pub media: MediaConfig,

    pub embeddings: EmbeddingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: "mmdbrowse=info".to_string(),
            browse: BrowseConfig::default(),
            media: MediaConfig::default(),
            embeddings: EmbeddingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("mmdbrowse").join("config.toml"))
    }

    /// Load configuration from the default location plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file exists but cannot be parsed, or
    /// if the resulting settings are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path` plus environment overrides
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or the settings are invalid.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(path, None)
    }

    fn build(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("browse.page_sizes")
            .source(env);

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(environment)
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browse.default_per_page == 0 {
            return Err(ConfigError::Message("browse.default_per_page must be at least 1".into()));
        }
        if self.browse.page_sizes.is_empty() || self.browse.page_sizes.contains(&0) {
            return Err(ConfigError::Message(
                "browse.page_sizes must be a non-empty list of positive sizes".into(),
            ));
        }
        if self.browse.search_limit == 0 {
            return Err(ConfigError::Message("browse.search_limit must be at least 1".into()));
        }
        if self.embeddings.enabled {
            if self.embeddings.base_url.trim().is_empty() || self.embeddings.model.trim().is_empty() {
                return Err(ConfigError::Message(
                    "embeddings.base_url and embeddings.model must be set when embeddings are enabled".into(),
                ));
            }
            if self.embeddings.timeout_secs == 0 {
                return Err(ConfigError::Message("embeddings.timeout_secs must be at least 1".into()));
            }
        }
        Ok(())
    }

    /// Data directory, falling back to `<data dir>/mmdbrowse`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no data directory is configured and the system
    /// data directory cannot be determined.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join("mmdbrowse"))
            .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config path cannot be determined or writing fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
