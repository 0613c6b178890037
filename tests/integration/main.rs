//! Integration tests using WireMock
//!
//! These tests drive the public client against a mock HTTP server and cover
//! the full request/response cycle: serialization, authentication headers,
//! SSE decoding and error mapping.

mod answer;
mod batch;
mod deep_research;
mod search;

use valyu_client::ValyuClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "vk_integration_key";

/// Starts a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Builds a client pointed at the mock server.
pub fn client_for(server: &MockServer) -> ValyuClient {
    ValyuClient::builder()
        .api_key(TEST_API_KEY)
        .base_url(server.uri())
        .build()
        .expect("Failed to build client")
}

/// A mock that only matches authenticated requests.
pub fn mock_with_auth(method_matcher: &str, path_matcher: &str) -> wiremock::MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("x-api-key", TEST_API_KEY))
}

/// A JSON response template.
pub fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}
