//! Service implementations for the Valyu API.
//!
//! Every service shares one [`ServiceContext`] holding the transport, the
//! credentials and the headers common to all calls.

mod answer;
mod batch;
mod contents;
mod datasources;
mod deep_research;
mod search;

pub use answer::AnswerService;
pub use batch::BatchService;
pub use contents::ContentsService;
pub use datasources::DatasourcesService;
pub use deep_research::{DeepResearchService, ResearchObserver};
pub use search::SearchService;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::AuthProvider;
use crate::errors::{ApiErrorResponse, ValyuError, ValyuResult};
use crate::observability::{error_kind, redact, MetricsCollector, OperationTimer};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, StreamingResponse};
use crate::types::ApiResponse;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("valyu-rust/", env!("CARGO_PKG_VERSION"));

/// Shared plumbing for the resource services.
pub struct ServiceContext {
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    custom_headers: Vec<(String, String)>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl ServiceContext {
    /// Creates a context.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
        custom_headers: Vec<(String, String)>,
        metrics: Option<Arc<dyn MetricsCollector>>,
    ) -> Self {
        Self {
            transport,
            auth,
            custom_headers,
            metrics,
        }
    }

    pub(crate) fn metrics(&self) -> Option<Arc<dyn MetricsCollector>> {
        self.metrics.clone()
    }

    pub(crate) fn timer(&self, operation: &'static str) -> OperationTimer {
        OperationTimer::start(operation, self.metrics.clone())
    }

    /// Headers for a request. `authenticated` controls the API key header.
    fn headers(&self, streaming: bool, authenticated: bool) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
        if streaming {
            headers.insert("Accept".to_string(), "text/event-stream".to_string());
        }

        for (name, value) in &self.custom_headers {
            headers.insert(name.clone(), value.clone());
        }

        if authenticated {
            self.auth.apply_auth(&mut headers);
        }
        headers
    }

    /// Builds an authenticated GET request.
    pub(crate) fn get(&self, path: impl Into<String>) -> HttpRequest {
        let mut request = HttpRequest::get(path);
        request.headers = self.headers(false, true);
        request
    }

    /// Builds a GET request that carries no API key.
    pub(crate) fn get_unauthenticated(&self, path: impl Into<String>) -> HttpRequest {
        let mut request = HttpRequest::get(path);
        request.headers = self.headers(false, false);
        request
    }

    /// Builds an authenticated DELETE request.
    pub(crate) fn delete(&self, path: impl Into<String>) -> HttpRequest {
        let mut request = HttpRequest::delete(path);
        request.headers = self.headers(false, true);
        request
    }

    /// Builds an authenticated POST request with a JSON body.
    pub(crate) fn post<B: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> ValyuResult<HttpRequest> {
        let body = serde_json::to_vec(body).map_err(|e| ValyuError::Serialization {
            message: format!("Failed to serialize request: {}", e),
        })?;
        let mut request = HttpRequest::post(path).with_body(body);
        request.headers = self.headers(false, true);
        Ok(request)
    }

    /// Builds an authenticated POST request for an SSE response.
    pub(crate) fn post_streaming<B: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> ValyuResult<HttpRequest> {
        let mut request = self.post(path, body)?;
        request.headers = self.headers(true, true);
        Ok(request)
    }

    /// Sends a request and returns the raw response if it is 2xx.
    ///
    /// Non-2xx statuses become [`ValyuError::Api`] carrying the server's
    /// message. Transport failures become network or timeout errors.
    pub(crate) async fn send_checked(&self, request: HttpRequest) -> ValyuResult<HttpResponse> {
        let path = redact(&request.path);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let message = ApiErrorResponse::message_from_body(response.status, &response.body);
            warn!(status = response.status, %path, error = %message, "API returned error status");
            return Err(ValyuError::api(response.status, message));
        }

        debug!(status = response.status, %path, bytes = response.body.len(), "API call succeeded");
        Ok(response)
    }

    /// Sends a request and decodes the body, failing on anything but a
    /// decodable 2xx response. Used where the caller needs an error rather
    /// than a failure response.
    pub(crate) async fn execute_checked<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> ValyuResult<R> {
        let response = self.send_checked(request).await?;
        response.json::<R>().map_err(|e| ValyuError::Serialization {
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Sends a request and decodes the body.
    ///
    /// Everything the API reports (error statuses, undecodable bodies) comes
    /// back as a failure response. Only transport failures are `Err`.
    pub(crate) async fn execute<R: ApiResponse>(
        &self,
        operation: &'static str,
        request: HttpRequest,
    ) -> ValyuResult<R> {
        let timer = self.timer(operation);

        match self.execute_checked::<R>(request).await {
            Ok(response) => {
                timer.finish(response.is_success());
                Ok(response)
            }
            Err(e @ (ValyuError::Api { .. } | ValyuError::Serialization { .. })) => {
                let message = e.message();
                timer.fail(&e);
                Ok(R::failure(message))
            }
            Err(e) => {
                timer.fail(&e);
                Err(e)
            }
        }
    }

    /// Reports a request rejected before it reached the network.
    pub(crate) fn reject<R: ApiResponse>(&self, operation: &'static str, error: ValyuError) -> R {
        debug!(operation, error = %error, "Request rejected by validation");
        self.timer(operation).fail(&error);
        R::failure(error.message())
    }

    /// Opens a streaming request.
    pub(crate) async fn open_stream(&self, request: HttpRequest) -> ValyuResult<StreamingResponse> {
        Ok(self.transport.send_streaming(request).await?)
    }

    pub(crate) fn record_error(&self, error: &ValyuError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(error_kind(error));
        }
    }

    pub(crate) fn record_poll(&self, operation: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_poll(operation);
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("auth_scheme", &self.auth.scheme())
            .field("custom_headers", &self.custom_headers.len())
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// Percent-encodes one path segment, so ids cannot add segments or a query.
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Appends URL-encoded query parameters to `path`.
pub(crate) fn with_query<'a, I>(path: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        serializer.append_pair(key, &value);
        any = true;
    }

    if any {
        format!("{}?{}", path, serializer.finish())
    } else {
        path.to_string()
    }
}
