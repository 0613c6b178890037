//! Authentication module for the Valyu client.
//!
//! The Valyu API authenticates with a static key sent in the `x-api-key`
//! header.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::errors::ValyuError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication provider trait.
///
/// Implementations of this trait provide authentication credentials
/// for API requests.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);

    /// Get the authentication scheme name.
    fn scheme(&self) -> &str;

    /// Validate the credentials.
    fn validate(&self) -> Result<(), ValyuError>;
}

/// API key authentication provider.
pub struct ApiKeyAuth {
    api_key: SecretString,
}

impl ApiKeyAuth {
    /// Creates a new API key authentication provider.
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Creates from a string API key.
    pub fn from_string(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
        }
    }

    /// Gets a hint of the API key for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        key_hint(self.api_key.expose_secret())
    }
}

/// Last four characters of `key`, or `****` for keys of four or fewer.
pub(crate) fn key_hint(key: &str) -> String {
    let count = key.chars().count();
    if count > 4 {
        let tail: String = key.chars().skip(count - 4).collect();
        format!("...{}", tail)
    } else {
        "****".to_string()
    }
}

impl AuthProvider for ApiKeyAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            API_KEY_HEADER.to_string(),
            self.api_key.expose_secret().to_string(),
        );
    }

    fn scheme(&self) -> &str {
        "ApiKey"
    }

    fn validate(&self) -> Result<(), ValyuError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValyuError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("api_key", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}
