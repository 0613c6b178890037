//! Contents extraction service.

use std::sync::Arc;
use tracing::instrument;

use super::ServiceContext;
use crate::errors::ValyuResult;
use crate::types::{ContentsRequest, ContentsResponse};

const OPERATION: &str = "contents";

/// Contents service (`POST /contents`).
#[derive(Debug, Clone)]
pub struct ContentsService {
    ctx: Arc<ServiceContext>,
}

impl ContentsService {
    /// Creates a new contents service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Extracts the contents of up to ten URLs.
    #[instrument(skip(self, request), fields(urls = request.urls.len()))]
    pub async fn extract(&self, request: ContentsRequest) -> ValyuResult<ContentsResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject(OPERATION, e));
        }

        let http_request = self.ctx.post("contents", &request)?;
        self.ctx.execute(OPERATION, http_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{test_context, MockResponse, MockTransport};

    #[tokio::test]
    async fn test_extract() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(MockResponse::json(
            200,
            serde_json::json!({
                "success": true,
                "tx_id": "tx_c",
                "urls_requested": 1,
                "urls_processed": 1,
                "urls_failed": 0,
                "results": [{"url": "https://example.com", "title": "Example", "content": "body", "length": 4, "source": "web", "price": 0.001}],
                "total_cost_dollars": 0.001,
                "total_characters": 4
            }),
        ));
        let service = ContentsService::new(test_context(transport.clone()));

        let response = service
            .extract(ContentsRequest::new(["https://example.com"]).screenshot(true))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.results[0].title, "Example");
        let body = transport.last_request().unwrap().json_body();
        assert_eq!(body["urls"], serde_json::json!(["https://example.com"]));
        assert_eq!(body["screenshot"], true);
    }

    #[tokio::test]
    async fn test_too_many_urls() {
        let transport = Arc::new(MockTransport::new());
        let service = ContentsService::new(test_context(transport.clone()));
        let urls: Vec<String> = (0..11).map(|i| format!("https://e{i}.com")).collect();

        let response = service.extract(ContentsRequest::new(urls)).await.unwrap();

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Maximum 10 URLs allowed per request")
        );
        assert_eq!(transport.request_count(), 0);
    }
}
