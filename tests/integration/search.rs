//! Integration tests for search and contents

use super::*;
use serde_json::json;
use valyu_client::{ContentsRequest, SearchRequest, SearchType, ValyuError};
use wiremock::matchers::body_partial_json;

#[tokio::test]
async fn test_search_success() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/deepsearch")
        .and(body_partial_json(json!({
            "query": "CRISPR off-target effects",
            "search_type": "proprietary",
            "max_num_results": 3,
            "exclude_sources": ["example.com"]
        })))
        .respond_with(json_response(
            200,
            json!({
                "success": true,
                "tx_id": "tx_it_1",
                "query": "CRISPR off-target effects",
                "results": [{
                    "title": "Off-target analysis",
                    "url": "https://pubmed.ncbi.nlm.nih.gov/1",
                    "content": "...",
                    "source": "valyu/pubmed"
                }],
                "total_deduction_dollars": 0.003
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = SearchRequest::new("CRISPR off-target effects")
        .search_type(SearchType::Proprietary)
        .max_num_results(3)
        .excluded_sources(vec!["example.com".to_string()]);

    let response = client.search().search(request).await.unwrap();

    assert!(response.success);
    assert_eq!(response.tx_id.as_deref(), Some("tx_it_1"));
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].title, "Off-target analysis");
}

#[tokio::test]
async fn test_search_error_status_becomes_failure_response() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/deepsearch")
        .respond_with(json_response(401, json!({"error": "Invalid API key"})))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search()
        .search(SearchRequest::new("anything"))
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("API error (HTTP 401): Invalid API key")
    );
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_invalid_search_never_reaches_server() {
    let server = setup_mock_server().await;

    let response = client_for(&server)
        .search()
        .search(SearchRequest::new("q").start_date("2024/01/01"))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.error.unwrap().contains("start_date"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_contents_undecodable_body() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/contents")
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .contents()
        .extract(ContentsRequest::new(["https://example.com"]))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response
        .error
        .unwrap()
        .starts_with("Failed to parse response"));
}

#[tokio::test]
async fn test_connection_refused_is_error() {
    let server = setup_mock_server().await;
    let uri = server.uri();
    drop(server);

    let client = ValyuClient::builder()
        .api_key(TEST_API_KEY)
        .base_url(uri)
        .build()
        .unwrap();

    let result = client.search().search(SearchRequest::new("q")).await;
    assert!(matches!(
        result,
        Err(ValyuError::Network { .. } | ValyuError::Timeout { .. })
    ));
}
