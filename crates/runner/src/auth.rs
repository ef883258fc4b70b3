//! Bearer token acquisition and caching
//!
//! Tokens come either from configuration as a static string or from an
//! OAuth2 client-credentials exchange. Exchanged tokens are cached until they
//! come within `refresh_margin_secs` of expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{RunnerError, RunnerResult};

/// Lifetime assumed when the token endpoint does not send `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Supplies bearer tokens to requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> RunnerResult<String>;

    /// Drop any cached token so the next call fetches a fresh one
    async fn invalidate(&self) {}
}

/// A pre-issued token that never changes
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> RunnerResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

/// Client-credentials session with a cached token
pub struct AuthSession {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    margin: Duration,
    cache: Mutex<Option<CachedToken>>,
}

impl AuthSession {
    pub fn new(config: &AuthConfig, client: reqwest::Client) -> RunnerResult<Self> {
        let missing = |field: &str| RunnerError::InvalidConfig(format!("auth.{} is required", field));

        Ok(Self {
            client,
            token_url: config.token_url.clone().ok_or_else(|| missing("token_url"))?,
            client_id: config.client_id.clone().ok_or_else(|| missing("client_id"))?,
            client_secret: config.client_secret().ok_or_else(|| missing("client_secret"))?,
            scope: config.scope.clone(),
            margin: Duration::from_secs(config.refresh_margin_secs),
            cache: Mutex::new(None),
        })
    }

    async fn fetch(&self) -> RunnerResult<CachedToken> {
        info!("Requesting access token from {}", self.token_url);

        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self.client.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RunnerError::Auth(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await?;
        let lifetime = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenSource for AuthSession {
    async fn token(&self) -> RunnerResult<String> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Instant::now(), self.margin) {
                return Ok(cached.access_token.clone());
            }
            debug!("cached token near expiry, refreshing");
        }

        let fresh = self.fetch().await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
