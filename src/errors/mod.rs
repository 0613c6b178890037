//! Error types for the Valyu client.
//!
//! Input validation failures and API-level failures are normally reported as
//! `success: false` response values; `ValyuError` is the channel for transport
//! failures, cancellation, and the poller's terminal conditions.

use std::time::Duration;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for Valyu operations.
pub type ValyuResult<T> = Result<T, ValyuError>;

/// Error type for Valyu client operations.
#[derive(Debug, Error)]
pub enum ValyuError {
    /// Configuration error (missing API key, bad base URL, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Client-side validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
        /// The parameter that caused the error.
        param: Option<String>,
        /// The invalid value.
        value: Option<String>,
    },

    /// The API answered with a failure (non-2xx status or `success: false`).
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code, 200 when the failure was reported in-band.
        status_code: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network/connection error.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// Request or stream deadline exceeded.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// A poll loop hit its wall-clock ceiling before a terminal state.
    #[error("Maximum wait time exceeded after {waited:?}")]
    WaitTimeout {
        /// Time spent polling.
        waited: Duration,
    },

    /// A long-running task ended in a non-successful terminal state.
    #[error("Task {status}")]
    TaskFailed {
        /// Terminal status reported by the API.
        status: String,
    },

    /// Streaming error.
    #[error("Stream error: {message}")]
    Stream {
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ValyuError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ValyuError::Validation {
            message: message.into(),
            param: None,
            value: None,
        }
    }

    /// Creates a validation error with parameter.
    pub fn validation_param(
        message: impl Into<String>,
        param: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        ValyuError::Validation {
            message: message.into(),
            param: Some(param.into()),
            value,
        }
    }

    /// Creates an API error.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        ValyuError::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns the bare message, without the variant prefix.
    ///
    /// This is the text placed in the `error` field of failure responses.
    pub fn message(&self) -> String {
        match self {
            ValyuError::Configuration { message }
            | ValyuError::Validation { message, .. }
            | ValyuError::Network { message }
            | ValyuError::Timeout { message }
            | ValyuError::Stream { message }
            | ValyuError::Serialization { message } => message.clone(),
            ValyuError::Api { .. }
            | ValyuError::Cancelled
            | ValyuError::WaitTimeout { .. }
            | ValyuError::TaskFailed { .. } => self.to_string(),
        }
    }

    /// Returns true for client-side validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, ValyuError::Validation { .. })
    }

    /// Returns true if the operation was stopped by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ValyuError::Cancelled)
    }
}

/// Error body returned by the API on failure.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Some endpoints use `message` instead.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorResponse {
    /// Extracts a human-readable message from a raw error body.
    pub fn message_from_body(status: u16, body: &[u8]) -> String {
        let parsed: ApiErrorResponse = serde_json::from_slice(body).unwrap_or_default();
        parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status))
    }
}

impl From<reqwest::Error> for ValyuError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ValyuError::Timeout {
                message: err.to_string(),
            }
        } else {
            ValyuError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<TransportError> for ValyuError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { .. } => ValyuError::Timeout {
                message: err.to_string(),
            },
            _ => ValyuError::Network {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ValyuError {
    fn from(err: serde_json::Error) -> Self {
        ValyuError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ValyuError {
    fn from(err: url::ParseError) -> Self {
        ValyuError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
