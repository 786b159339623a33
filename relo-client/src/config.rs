//! Client configuration

use std::path::PathBuf;

use crate::token::ACCESS_TOKEN_KEY;

/// Client configuration for connecting to the dashboard backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:8000/api")
    pub base_url: String,

    /// Request timeout in seconds. `None` leaves reqwest's default in place.
    pub timeout: Option<u64>,

    /// Token store key holding the access token
    pub token_key: String,

    /// JSON file backing the token store. `None` keeps tokens in memory.
    pub token_file: Option<PathBuf>,

    /// Reload permissions whenever the window regains focus
    pub refresh_on_focus: bool,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            token_key: ACCESS_TOKEN_KEY.to_string(),
            token_file: None,
            refresh_on_focus: true,
        }
    }

    /// Load configuration from `RELO_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("RELO_API_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("RELO_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .or(defaults.timeout),
            token_key: std::env::var("RELO_TOKEN_KEY").unwrap_or(defaults.token_key),
            token_file: std::env::var("RELO_TOKEN_FILE")
                .ok()
                .map(PathBuf::from)
                .or(defaults.token_file),
            refresh_on_focus: std::env::var("RELO_REFRESH_ON_FOCUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_on_focus),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Set the access token key
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Persist tokens in a JSON file
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Enable or disable refresh-on-focus
    pub fn with_refresh_on_focus(mut self, enabled: bool) -> Self {
        self.refresh_on_focus = enabled;
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}
