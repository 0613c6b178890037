//! HTTP transport implementation.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use super::{StreamingResponse, TransportError};
use crate::observability::redact;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// DELETE request.
    Delete,
}

/// HTTP request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, including any query string.
    pub path: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request timeout override.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    fn with_method(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a new GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::with_method(HttpMethod::Get, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::with_method(HttpMethod::Post, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::with_method(HttpMethod::Delete, path)
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, with lowercase names.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns a header value by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// HTTP transport trait.
///
/// The seam between the client and the network; tests substitute
/// [`crate::mocks::MockTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and buffer the whole response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send an HTTP request and return the body as a byte stream.
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Builds the full URL for a path.
    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn prepare(&self, request: HttpRequest) -> RequestBuilder {
        let url = self.build_url(&request.path);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        req_builder
    }

    fn map_send_error(&self, err: &reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout { timeout }
        } else if err.is_connect() {
            TransportError::Connection {
                message: redact(&err.to_string()),
            }
        } else {
            TransportError::InvalidResponse {
                message: redact(&err.to_string()),
            }
        }
    }
}

fn collect_headers(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_ascii_lowercase(),
                v.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(
        skip(self, request),
        fields(method = ?request.method, path = %redact(&request.path))
    )]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let response = self
            .prepare(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e, timeout))?;

        let status = response.status().as_u16();
        let headers = collect_headers(&response);
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(&e, timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    #[instrument(
        skip(self, request),
        fields(method = ?request.method, path = %redact(&request.path))
    )]
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        // Streams may legitimately outlive the request timeout; only the
        // per-request override bounds the whole exchange.
        let timeout = request.timeout;
        let mut req_builder = self.prepare(request);
        if let Some(timeout) = timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let connect_timeout = timeout.unwrap_or(self.timeout);
        let response = tokio::time::timeout(connect_timeout, req_builder.send())
            .await
            .map_err(|_| TransportError::Timeout {
                timeout: connect_timeout,
            })?
            .map_err(|e| self.map_send_error(&e, connect_timeout))?;

        let status = response.status().as_u16();
        let headers = collect_headers(&response);

        let stream = response.bytes_stream().map(move |result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        timeout: connect_timeout,
                    }
                } else {
                    TransportError::Connection {
                        message: redact(&e.to_string()),
                    }
                }
            })
        });

        Ok(StreamingResponse {
            status,
            headers,
            stream: Box::pin(stream),
        })
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
