//! Search service.

use std::sync::Arc;
use tracing::instrument;

use super::ServiceContext;
use crate::errors::ValyuResult;
use crate::types::{SearchRequest, SearchResponse};

const OPERATION: &str = "search";

/// Search service (`POST /deepsearch`).
#[derive(Debug, Clone)]
pub struct SearchService {
    ctx: Arc<ServiceContext>,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Runs a search.
    ///
    /// Invalid parameters and API failures come back as a response with
    /// `success: false`; only transport failures are `Err`.
    #[instrument(skip(self, request), fields(search_type = ?request.search_type, max_results = request.max_num_results))]
    pub async fn search(&self, request: SearchRequest) -> ValyuResult<SearchResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject(OPERATION, e));
        }

        let http_request = self.ctx.post("deepsearch", &request)?;
        self.ctx.execute(OPERATION, http_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{fixtures, test_context, MockTransport};
    use crate::transport::HttpMethod;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_search_posts_payload() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(fixtures::search_response());
        let service = SearchService::new(test_context(transport.clone()));

        let response = service
            .search(
                SearchRequest::new("quantum error correction")
                    .max_num_results(5)
                    .excluded_sources(["reddit.com"]),
            )
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.results.len(), 2);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "deepsearch");
        let body = request.json_body();
        assert_eq!(body["query"], "quantum error correction");
        assert_eq!(body["max_num_results"], 5);
        assert_eq!(body["exclude_sources"], serde_json::json!(["reddit.com"]));
        assert!(body.get("start_date").is_none());
    }

    #[tokio::test]
    async fn test_invalid_request_never_hits_network() {
        let transport = Arc::new(MockTransport::new());
        let service = SearchService::new(test_context(transport.clone()));

        let response = service
            .search(SearchRequest::new("q").start_date("2024/01/01"))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid start_date format. Must be YYYY-MM-DD")
        );
        assert_eq!(transport.request_count(), 0);
    }
}
