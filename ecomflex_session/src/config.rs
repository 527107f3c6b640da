//! Session client configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::auth::strategy::BypassIdentity;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1/";
/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
/// Default prefix marking development placeholder tokens
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "mock-";

/// Complete session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api/v1/`
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Network-free admin identity. `None` disables the bypass strategy.
    pub elevated_bypass: Option<BypassIdentity>,
    /// Access tokens starting with this prefix are development placeholders
    pub placeholder_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            elevated_bypass: None,
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    ///
    /// - `ECOMFLEX_API_BASE_URL` (default `http://localhost:8000/api/v1/`)
    /// - `ECOMFLEX_REQUEST_TIMEOUT_SECS` (default 15)
    /// - `ECOMFLEX_ELEVATED_BYPASS` (default false)
    /// - `ECOMFLEX_BYPASS_EMAIL` / `ECOMFLEX_BYPASS_PASSWORD` (only read when the bypass is enabled)
    /// - `ECOMFLEX_PLACEHOLDER_PREFIX` (default `mock-`)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("ECOMFLEX_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let request_timeout_secs = match std::env::var("ECOMFLEX_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "ECOMFLEX_REQUEST_TIMEOUT_SECS".to_string(),
                reason: format!("'{}' is not a whole number of seconds", raw),
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let elevated_bypass = if parse_env_or("ECOMFLEX_ELEVATED_BYPASS", false) {
            let defaults = BypassIdentity::development();
            let email = std::env::var("ECOMFLEX_BYPASS_EMAIL").unwrap_or(defaults.email);
            let password = std::env::var("ECOMFLEX_BYPASS_PASSWORD").unwrap_or(defaults.password);
            Some(BypassIdentity::new(email, password))
        } else {
            None
        };

        let placeholder_prefix = std::env::var("ECOMFLEX_PLACEHOLDER_PREFIX")
            .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_PREFIX.to_string());

        let config = SessionConfig {
            api_base_url,
            request_timeout_secs,
            elevated_bypass,
            placeholder_prefix,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "ECOMFLEX_API_BASE_URL".to_string(),
                hint: format!("Set it to the REST API root, e.g. {}", DEFAULT_API_BASE_URL),
            });
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "ECOMFLEX_API_BASE_URL".to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ECOMFLEX_REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(bypass) = &self.elevated_bypass {
            if bypass.email.trim().is_empty() || bypass.password.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "ECOMFLEX_ELEVATED_BYPASS".to_string(),
                    reason: "Bypass identity needs a non-empty email and password".to_string(),
                });
            }
        }

        if self.placeholder_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                var: "ECOMFLEX_PLACEHOLDER_PREFIX".to_string(),
                reason: "Must not be empty, every token would count as a placeholder".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Enable the bypass strategy with the given identity
    pub fn with_elevated_bypass(mut self, identity: BypassIdentity) -> Self {
        self.elevated_bypass = Some(identity);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
