//! Configuration module for the Valyu client.
//!
//! Holds the credential, base URL and request timeout. A built configuration is
//! immutable and shared read-only by every service.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::errors::{ValyuError, ValyuResult};

/// Default base URL for the Valyu API.
pub const DEFAULT_BASE_URL: &str = "https://api.valyu.ai/v1";

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "VALYU_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "VALYU_BASE_URL";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV: &str = "VALYU_TIMEOUT";

/// Configuration for the Valyu client.
#[derive(Clone)]
pub struct ValyuConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Custom headers to include in requests.
    pub custom_headers: Vec<(String, String)>,
}

impl ValyuConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ValyuConfigBuilder {
        ValyuConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VALYU_API_KEY` (required): API key for authentication
    /// - `VALYU_BASE_URL` (optional): Custom base URL
    /// - `VALYU_TIMEOUT` (optional): Request timeout in seconds
    pub fn from_env() -> ValyuResult<Self> {
        ValyuConfigBuilder::new().with_env_fallback().build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        crate::auth::key_hint(self.api_key.expose_secret())
    }
}

impl std::fmt::Debug for ValyuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValyuConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for `ValyuConfig`.
#[derive(Default)]
pub struct ValyuConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    custom_headers: Vec<(String, String)>,
}

impl ValyuConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> ValyuResult<Self> {
        let api_key = std::env::var(var_name).map_err(|_| ValyuError::Configuration {
            message: format!("Environment variable {} not set", var_name),
        })?;
        self.api_key = Some(api_key);
        Ok(self)
    }

    /// Fills every unset field from the `VALYU_*` environment variables.
    ///
    /// Explicitly set values always win over the environment.
    pub fn with_env_fallback(mut self) -> Self {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.api_key = Some(key);
            }
        }

        if self.base_url.is_none() {
            if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
                self.base_url = Some(base_url);
            }
        }

        if self.timeout.is_none() {
            if let Some(secs) = std::env::var(TIMEOUT_ENV)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                self.timeout = Some(Duration::from_secs(secs));
            }
        }

        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Adds a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ValyuResult<ValyuConfig> {
        let api_key = self.api_key.ok_or_else(|| ValyuError::Configuration {
            message: format!("{} is not set", API_KEY_ENV),
        })?;

        if api_key.trim().is_empty() {
            return Err(ValyuError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = Url::parse(&base_url)?;
        let loopback = matches!(
            parsed.host_str(),
            Some("localhost") | Some("127.0.0.1") | Some("[::1]")
        );
        if parsed.scheme() != "https" && !(parsed.scheme() == "http" && loopback) {
            return Err(ValyuError::Configuration {
                message: "Base URL must use HTTPS".to_string(),
            });
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ValyuError::Configuration {
                message: "Timeout must be greater than zero".to_string(),
            });
        }

        Ok(ValyuConfig {
            api_key: SecretString::new(api_key),
            base_url,
            timeout,
            custom_headers: self.custom_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_success() {
        let config = ValyuConfig::builder()
            .api_key("val_test_api_key_12345")
            .base_url("https://staging.valyu.ai/v1/")
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        assert_eq!(config.api_key(), "val_test_api_key_12345");
        assert_eq!(config.base_url, "https://staging.valyu.ai/v1");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ValyuConfig::builder().api_key("val_test").build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_config_builder_missing_api_key() {
        let result = ValyuConfig::builder().build();
        assert!(matches!(result, Err(ValyuError::Configuration { .. })));
    }

    #[test]
    fn test_config_builder_empty_api_key() {
        let result = ValyuConfig::builder().api_key("   ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_insecure_remote_url() {
        let result = ValyuConfig::builder()
            .api_key("val_test")
            .base_url("http://api.valyu.ai/v1")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_allows_loopback_http() {
        let config = ValyuConfig::builder()
            .api_key("val_test")
            .base_url("http://127.0.0.1:8080")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_rejects_unparseable_url() {
        let result = ValyuConfig::builder()
            .api_key("val_test")
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(ValyuError::Configuration { .. })));
    }

    #[test]
    fn test_api_key_hint() {
        let config = ValyuConfig::builder()
            .api_key("val_secret_key_12345")
            .build()
            .unwrap();

        let hint = config.api_key_hint();
        assert_eq!(hint, "...2345");
        assert!(!hint.contains("secret"));

        let config = ValyuConfig::builder()
            .api_key("val_schlüssel_ää€")
            .build()
            .unwrap();
        assert_eq!(config.api_key_hint(), "..._ää€");
    }

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = ValyuConfig::builder()
            .api_key("val_secret_key")
            .build()
            .unwrap();

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("val_secret_key"));
    }
}
