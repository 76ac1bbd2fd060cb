//! Configuration loading
//!
//! Connection settings for a D365 organization, loaded from environment
//! variables (the default) or a TOML file.

use std::path::Path;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for one D365 organization.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Organization URL, e.g. `https://org.crm.dynamics.com`.
    pub base_url: String,
    /// Azure AD tenant the application is registered in.
    pub tenant_id: String,
    /// Application (client) id.
    pub client_id: String,
    /// Client secret for the application registration.
    pub client_secret: String,
    /// Per-request timeout in seconds. Defaults to 30.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from `D365_*` environment variables.
    ///
    /// Requires `D365_BASE_URL`, `D365_TENANT_ID`, `D365_CLIENT_ID` and
    /// `D365_CLIENT_SECRET`; `D365_TIMEOUT_SECS` is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_url: require_var("D365_BASE_URL")?,
            tenant_id: require_var("D365_TENANT_ID")?,
            client_id: require_var("D365_CLIENT_ID")?,
            client_secret: require_var("D365_CLIENT_SECRET")?,
            timeout_secs: std::env::var("D365_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        };
        config.validate()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()
    }

    /// Validate and normalize the loaded settings.
    fn validate(mut self) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("base_url", &self.base_url),
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url is not a valid URL: {}", e)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got scheme {}",
                url.scheme()
            )));
        }

        // The service root is appended later; keep the origin bare.
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }

        Ok(self)
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
