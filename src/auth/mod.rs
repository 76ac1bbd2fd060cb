//! Azure AD authentication
//!
//! Implements the OAuth2 client credentials flow for app-only access to
//! Microsoft Dynamics 365, with an expiry-cached bearer token shared by all
//! outbound calls.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Config;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("identity provider rejected token request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse token response: {0}")]
    Parse(String),
}

/// Token response from Azure AD
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    #[serde(default)]
    token_type: String,
    expires_in: u64,
}

// Consider a token expired this long before its actual expiry.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Cached token with expiry tracking
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        self.expires_at > Instant::now() + EXPIRY_LEEWAY
    }
}

/// Anything that can produce a bearer token for outbound D365 calls.
///
/// The request proxy takes this as an injected dependency, so callers with
/// externally managed tokens, and tests, can supply their own source.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

/// Client credentials token cache for a single tenant/application pair.
///
/// Lives for the process lifetime and refreshes lazily once the cached
/// expiry (minus leeway) has passed. Concurrent callers that find the cache
/// expired may each trigger a refresh; token issuance is idempotent, so the
/// race is left unsynchronized across the network call.
#[derive(Debug)]
pub struct TokenCache {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
    http_client: Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a token cache for the given tenant and application.
    ///
    /// `resource` is the D365 organization URL the tokens are minted for,
    /// e.g. `https://org.crm.dynamics.com`.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource: &str,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope_for(resource),
            http_client: Client::new(),
            cached: RwLock::new(None),
        }
    }

    /// Build a token cache from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.tenant_id,
            &config.client_id,
            &config.client_secret,
            &config.base_url,
        )
    }

    /// Get the token endpoint URL for this tenant
    fn token_endpoint(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        )
    }

    /// Acquire a new token from Azure AD and cache it
    async fn acquire_token(&self) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token request rejected: {} - {}", status, body);
            return Err(AuthError::Rejected { status, body });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        let cached = CachedToken {
            access_token: token_response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token_response.expires_in),
        };

        {
            let mut cache = self.cached.write().await;
            *cache = Some(cached);
        }

        tracing::info!(
            "Token acquired successfully, expires in {} seconds",
            token_response.expires_in
        );

        Ok(token_response.access_token)
    }

    /// Drop the cached token; the next call acquires a fresh one.
    pub async fn clear(&self) {
        let mut cache = self.cached.write().await;
        *cache = None;
    }
}

#[async_trait]
impl TokenSource for TokenCache {
    async fn get_token(&self) -> Result<String, AuthError> {
        // Check cache first
        {
            let cache = self.cached.read().await;
            if let Some(ref cached) = *cache {
                if cached.is_valid() {
                    tracing::debug!("Using cached token");
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Token expired or not cached, acquire new one
        tracing::info!("Acquiring new access token for scope: {}", self.scope);
        self.acquire_token().await
    }
}

/// A fixed, externally managed bearer token.
///
/// Useful when the token lifecycle is owned elsewhere, and as a fake in
/// tests of anything that takes a [`TokenSource`].
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn get_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

/// Derive the OAuth scope for a D365 organization URL.
///
/// The scope is the URL origin plus `/.default`; any path on the configured
/// endpoint is irrelevant to the token audience.
fn scope_for(resource: &str) -> String {
    let origin = if let Ok(url) = Url::parse(resource) {
        format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""))
    } else {
        resource.split('/').take(3).collect::<Vec<_>>().join("/")
    };
    format!("{}/.default", origin)
}
