//! Runner configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Environment variable consulted when `auth.client_secret` is not set
pub const CLIENT_SECRET_ENV: &str = "FINPROBE_CLIENT_SECRET";

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL that relative case URLs are joined to
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout_ms: u64,

    /// Retries for connection failures and timeouts
    pub retries: u32,

    /// Backoff between retries, multiplied by the attempt number
    pub retry_backoff_ms: u64,

    /// Directory for result files
    pub output_dir: PathBuf,

    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,

    /// Bearer token acquisition
    pub auth: Option<AuthConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 30_000,
            retries: 2,
            retry_backoff_ms: 250,
            output_dir: PathBuf::from("test-results"),
            default_headers: BTreeMap::new(),
            auth: None,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Pre-issued token; takes precedence over the client-credentials flow
    pub static_token: Option<String>,

    /// OAuth2 token endpoint
    pub token_url: Option<String>,

    pub client_id: Option<String>,

    pub client_secret: Option<String>,

    pub scope: Option<String>,

    /// Refresh this many seconds before the token expires
    pub refresh_margin_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            static_token: None,
            token_url: None,
            client_id: None,
            client_secret: None,
            scope: None,
            refresh_margin_secs: 30,
        }
    }
}

impl AuthConfig {
    /// Client secret from the file or from [`CLIENT_SECRET_ENV`]
    pub fn client_secret(&self) -> Option<String> {
        self.client_secret
            .clone()
            .or_else(|| std::env::var(CLIENT_SECRET_ENV).ok())
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> RunnerResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> RunnerResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.request_timeout_ms == 0 {
            return Err(RunnerError::InvalidConfig(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(auth) = &self.auth {
            if auth.static_token.is_none() && auth.token_url.is_some() && auth.client_id.is_none() {
                return Err(RunnerError::InvalidConfig(
                    "auth.client_id is required with auth.token_url".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Join a case URL to the base URL unless it is already absolute
    pub fn resolve_url(&self, url: &str) -> RunnerResult<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }
        if self.base_url.is_empty() {
            return Err(RunnerError::InvalidUrl {
                url: url.to_string(),
                reason: "relative URL without a base_url".to_string(),
            });
        }
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        ))
    }
}
