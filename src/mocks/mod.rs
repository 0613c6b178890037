//! Mock transport and fixtures for testing.
//!
//! [`MockTransport`] replays scripted replies in order and records every
//! request it receives. Streaming replies can be split into arbitrary
//! chunks, left open, or broken off with a transport error.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::ApiKeyAuth;
use crate::services::ServiceContext;
use crate::transport::{
    ByteStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, StreamingResponse,
    TransportError,
};

/// API key used by [`test_context`].
pub const TEST_API_KEY: &str = "vk_test_key";

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, including the query string.
    pub path: String,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `Null` when absent or not JSON.
    pub fn json_body(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

/// A buffered mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercase names.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// A JSON response.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self::bytes(
            status,
            "application/json",
            serde_json::to_vec(&value).unwrap_or_default(),
        )
    }

    /// A plain text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, "text/plain", body.as_bytes().to_vec())
    }

    /// A response with an arbitrary body and content type.
    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body,
        }
    }
}

/// How a scripted stream ends after its chunks.
#[derive(Debug, Clone)]
enum StreamEnd {
    Close,
    Pending,
    Fail(TransportError),
}

#[derive(Debug, Clone)]
enum MockReply {
    Buffered(MockResponse),
    Stream { chunks: Vec<String>, end: StreamEnd },
    Fail(TransportError),
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a buffered response.
    pub fn push_response(&self, response: MockResponse) {
        lock(&self.replies).push_back(MockReply::Buffered(response));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        lock(&self.replies).push_back(MockReply::Fail(error));
    }

    /// Queues a 200 SSE body delivered in the given chunks.
    pub fn push_streaming(&self, chunks: Vec<String>) {
        self.push_stream(chunks, StreamEnd::Close);
    }

    /// Queues a 200 SSE body that stays open after its chunks.
    pub fn push_streaming_pending(&self, chunks: Vec<String>) {
        self.push_stream(chunks, StreamEnd::Pending);
    }

    /// Queues a 200 SSE body that fails after its chunks.
    pub fn push_streaming_then_error(&self, chunks: Vec<String>, error: TransportError) {
        self.push_stream(chunks, StreamEnd::Fail(error));
    }

    fn push_stream(&self, chunks: Vec<String>, end: StreamEnd) {
        lock(&self.replies).push_back(MockReply::Stream { chunks, end });
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn record(&self, request: &HttpRequest) {
        lock(&self.requests).push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            body: request.body.clone(),
            headers: request.headers.clone(),
        });
    }

    fn next_reply(&self) -> MockReply {
        lock(&self.replies).pop_front().unwrap_or_else(|| {
            MockReply::Buffered(MockResponse::json(
                500,
                serde_json::json!({"error": "No mock response configured"}),
            ))
        })
    }
}

fn chunk_stream(chunks: Vec<String>, end: StreamEnd) -> ByteStream {
    let body = stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok::<_, TransportError>(Bytes::from(c))),
    );
    match end {
        StreamEnd::Close => Box::pin(body),
        StreamEnd::Pending => Box::pin(body.chain(stream::pending())),
        StreamEnd::Fail(error) => Box::pin(body.chain(stream::once(async move { Err(error) }))),
    }
}

fn sse_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "text/event-stream".to_string());
    headers
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record(&request);

        match self.next_reply() {
            MockReply::Buffered(response) => Ok(HttpResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
            }),
            MockReply::Stream { chunks, .. } => Ok(HttpResponse {
                status: 200,
                headers: sse_headers(),
                body: chunks.concat().into_bytes(),
            }),
            MockReply::Fail(error) => Err(error),
        }
    }

    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        self.record(&request);

        match self.next_reply() {
            MockReply::Buffered(response) => {
                let body = Bytes::from(response.body);
                Ok(StreamingResponse {
                    status: response.status,
                    headers: response.headers,
                    stream: Box::pin(stream::once(async move { Ok(body) })),
                })
            }
            MockReply::Stream { chunks, end } => Ok(StreamingResponse {
                status: 200,
                headers: sse_headers(),
                stream: chunk_stream(chunks, end),
            }),
            MockReply::Fail(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &lock(&self.replies).len())
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// A service context over `transport`, authenticated with [`TEST_API_KEY`].
pub fn test_context(transport: Arc<MockTransport>) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(
        transport,
        Arc::new(ApiKeyAuth::from_string(TEST_API_KEY)),
        Vec::new(),
        None,
    ))
}

/// Canned API replies.
pub mod fixtures {
    use serde_json::json;

    use super::MockResponse;

    /// A successful search with two results.
    pub fn search_response() -> MockResponse {
        MockResponse::json(
            200,
            json!({
                "success": true,
                "tx_id": "tx_search",
                "query": "quantum error correction",
                "results": [
                    {
                        "title": "Surface codes",
                        "url": "https://arxiv.org/abs/1208.0928",
                        "content": "Surface codes are...",
                        "source": "valyu/arxiv",
                        "relevance_score": 0.92
                    },
                    {
                        "title": "Quantum error correction",
                        "url": "https://en.wikipedia.org/wiki/Quantum_error_correction",
                        "content": "QEC is...",
                        "source": "web"
                    }
                ],
                "results_by_source": {"web": 1, "proprietary": 1},
                "total_deduction_dollars": 0.0015,
                "total_characters": 1024
            }),
        )
    }

    /// An answer stream: results, two text fragments, metadata, `[DONE]`.
    ///
    /// Chunk boundaries fall inside lines.
    pub fn answer_sse_chunks() -> Vec<String> {
        let body = [
            r#"data: {"search_results":[{"title":"RAG survey","url":"https://arxiv.org/abs/2312.10997"}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Retrieval-augmented "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"generation."},"finish_reason":"stop"}]}"#,
            r#"data: {"success":true,"tx_id":"tx_123","original_query":"What is RAG?","data_type":"unstructured","search_results":[{"title":"RAG survey","url":"https://arxiv.org/abs/2312.10997"}],"cost":{"total_deduction_dollars":0.012,"search_deduction_dollars":0.002,"ai_deduction_dollars":0.01}}"#,
            "data: [DONE]",
        ]
        .join("\n")
            + "\n";

        let bytes = body.as_bytes();
        let mut chunks = Vec::new();
        let mut start = 0;
        for size in [7usize, 50, 13, 120].into_iter().cycle() {
            if start >= bytes.len() {
                break;
            }
            let end = (start + size).min(bytes.len());
            chunks.push(String::from_utf8_lossy(&bytes[start..end]).into_owned());
            start = end;
        }
        chunks
    }

    /// A deep research status with `messages` messages and matching progress.
    pub fn deep_research_status(status: &str, messages: u32) -> MockResponse {
        let messages: Vec<_> = (1..=messages).map(|i| json!(format!("step {i}"))).collect();
        MockResponse::json(
            200,
            json!({
                "success": true,
                "deepresearch_id": "dr_1",
                "status": status,
                "query": "State of fusion energy",
                "mode": "fast",
                "progress": {"current_step": messages.len(), "total_steps": 5},
                "messages": messages,
            }),
        )
    }

    /// A batch status where `finished` of five tasks are done.
    pub fn batch_status(status: &str, finished: u32) -> MockResponse {
        MockResponse::json(
            200,
            json!({
                "success": true,
                "batch": {
                    "batch_id": "b_1",
                    "status": status,
                    "mode": "standard",
                    "created_at": "2025-01-01T00:00:00Z",
                    "counts": {
                        "total": 5,
                        "completed": finished,
                        "running": 5 - finished
                    },
                    "cost": 0.0
                }
            }),
        )
    }
}
