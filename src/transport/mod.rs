//! HTTP transport layer for the Valyu client.
//!
//! Provides the HTTP transport abstraction and the reqwest-backed
//! implementation, including raw byte streams for SSE responses.

mod http;
mod streaming;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};
pub use streaming::{ByteStream, LineBuffer, StreamingResponse};

use std::time::Duration;

/// Transport error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}
