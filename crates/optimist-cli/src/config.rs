//! File configuration for the `optimist` binary
//!
//! ```toml
//! [backend]
//! latency_ms = 300
//! fail_initially = false
//!
//! [feed]
//! page_size = 10
//!
//! [search]
//! debounce_ms = 300
//! ```
//!
//! Every section and field is optional.

use optimist_core::BackendConfig;
use optimist_feed::{FeedConfig, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`OptimistConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for all three controllers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimistConfig {
    /// Mutation backend
    pub backend: BackendConfig,
    /// Paginated feed
    pub feed: FeedConfig,
    /// Debounced search
    pub search: SearchConfig,
}

impl OptimistConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
