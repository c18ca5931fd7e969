//! Configuration types for the REST client.
//!
//! These types are designed to be deserialized from TOML configuration files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{VenueError, VenueResult};

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST API configuration
    #[serde(default)]
    pub rest: RestConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ClientConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> VenueResult<Self> {
        toml::from_str(s).map_err(|e| VenueError::Configuration(format!("Invalid config: {}", e)))
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VenueResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VenueError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }
}

/// REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL for the REST API (empty = use the venue default)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Receive window in milliseconds (for timestamp validation)
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Server time synchronization
    #[serde(default)]
    pub time_sync: TimeSyncConfig,
}

fn default_base_url() -> String {
    String::new()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_recv_window_ms() -> u64 {
    5_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            recv_window_ms: default_recv_window_ms(),
            time_sync: TimeSyncConfig::default(),
        }
    }
}

impl RestConfig {
    /// Returns the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Server time synchronization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSyncConfig {
    /// Measure the clock drift against the server before requests
    #[serde(default = "default_auto_timestamp")]
    pub auto_timestamp: bool,
    /// How long a measured drift stays valid, in seconds
    #[serde(default = "default_recalculation_interval_secs")]
    pub recalculation_interval_secs: u64,
    /// Fixed offset added on top of the measured drift, in milliseconds
    #[serde(default)]
    pub manual_offset_ms: i64,
}

fn default_auto_timestamp() -> bool {
    true
}

fn default_recalculation_interval_secs() -> u64 {
    3 * 60 * 60
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        Self {
            auto_timestamp: default_auto_timestamp(),
            recalculation_interval_secs: default_recalculation_interval_secs(),
            manual_offset_ms: 0,
        }
    }
}

impl TimeSyncConfig {
    /// Returns the recalculation interval as a Duration.
    pub fn recalculation_interval(&self) -> Duration {
        Duration::from_secs(self.recalculation_interval_secs)
    }

    /// A policy that never contacts the server.
    pub fn disabled() -> Self {
        Self {
            auto_timestamp: false,
            ..Default::default()
        }
    }
}

/// Authentication configuration.
///
/// API keys are loaded from environment variables for security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Environment variable name for API secret
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
}

fn default_api_key_env() -> String {
    "BINANCE_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "BINANCE_API_SECRET".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
        }
    }
}

impl AuthConfig {
    /// Create a new auth config with environment variable names.
    pub fn new(api_key_env: impl Into<String>, api_secret_env: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            api_secret_env: api_secret_env.into(),
        }
    }

    /// Load API key from environment.
    pub fn load_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    /// Load API secret from environment.
    pub fn load_api_secret(&self) -> Option<String> {
        std::env::var(&self.api_secret_env).ok()
    }

    /// Returns true if API credentials are available in environment.
    pub fn has_credentials(&self) -> bool {
        self.load_api_key().is_some() && self.load_api_secret().is_some()
    }
}
