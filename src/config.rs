//! Search configuration loaded from TOML.
//!
//! Every field has a default, so an empty or missing file yields the stock
//! behaviour: union matching, minimum token length 2, `title > page > text`.

use crate::builder::DuplicatePolicy;
use crate::error::ConfigError;
use crate::search::{FieldWeights, MatchMode, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DOCSEARCH_CONFIG";

/// Environment variable naming an artifact to load at startup.
pub const INDEX_ENV: &str = "DOCSEARCH_INDEX";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count used when a request does not specify one.
    pub default_limit: usize,
    pub match_mode: MatchMode,
    pub duplicate_locations: DuplicatePolicy,
    /// Entries in the server's recent-query cache; 0 disables it.
    pub query_cache_size: usize,
    pub tokenizer: TokenizerConfig,
    pub weights: FieldWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            match_mode: MatchMode::Any,
            duplicate_locations: DuplicatePolicy::Reject,
            query_cache_size: 128,
            tokenizer: TokenizerConfig::default(),
            weights: FieldWeights::default(),
        }
    }
}

impl SearchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded search config from {}", path.display());
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Config path from `DOCSEARCH_CONFIG`, else `<config_dir>/docsearch/config.toml`.
    pub fn resolve_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokenizer.min_token_length == 0 {
            return Err(ConfigError::InvalidTokenLength);
        }
        self.weights.validate()?;
        Ok(())
    }
}

/// `<config_dir>/docsearch/config.toml`, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docsearch").join("config.toml"))
}
