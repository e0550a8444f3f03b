//! Runtime configuration
//!
//! Values come from defaults, then an optional JSON file, then command-line
//! flags applied by the binary.

use crate::error::ConfigError;
use crate::history::{DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_LIMIT};
use crate::types::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 650;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ENDPOINT: &str =
    "https://axesso-walmart-data-service.p.rapidapi.com/wlm/walmart-search-by-keyword";
pub const DEFAULT_SORT_BY: &str = "bestmatch";

/// Settings for the remote search API. The credential is always injected,
/// never compiled in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_host: Option<String>,
    pub sort_by: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            api_host: None,
            sort_by: DEFAULT_SORT_BY.to_string(),
        }
    }
}

// Hand-written so the credential never reaches a log line
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("sort_by", &self.sort_by)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet interval before a keystroke commits a query
    pub debounce_ms: u64,
    /// Full-page item count; a shorter page ends pagination
    pub page_size: usize,
    pub history_limit: usize,
    pub history_key: String,
    pub history_path: PathBuf,
    pub request_timeout_secs: u64,
    /// Abort superseded in-flight fetches instead of only ignoring their results
    pub cancel_superseded: bool,
    pub client: ClientConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            page_size: DEFAULT_PAGE_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            history_path: PathBuf::from(".incsearch").join("history.json"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cancel_superseded: true,
            client: ClientConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.history_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "history_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.client.endpoint.is_empty() {
            return Err(ConfigError::Invalid {
                field: "client.endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
