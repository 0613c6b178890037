//! Integration tests for streamed answers

use super::*;
use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use valyu_client::{AnswerRequest, StreamEvent};
use wiremock::matchers::{body_partial_json, header};

fn sse_body() -> String {
    [
        r#"data: {"search_results":[{"title":"Attention Is All You Need","url":"https://arxiv.org/abs/1706.03762"}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"Transformers use "}}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"self-attention."},"finish_reason":"stop"}]}"#,
        "",
        "data: not json at all",
        "",
        r#"data: {"success":true,"tx_id":"tx_ans","original_query":"How do transformers work?","cost":{"total_deduction_dollars":0.02}}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n")
}

async fn mount_answer(server: &wiremock::MockServer) {
    mock_with_auth("POST", "/answer")
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({"query": "How do transformers work?"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body(), "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_answer_stream_events() {
    let server = setup_mock_server().await;
    mount_answer(&server).await;
    let cancel = CancellationToken::new();

    let events: Vec<StreamEvent> = client_for(&server)
        .answer()
        .answer_stream(AnswerRequest::new("How do transformers work?"), &cancel)
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    let kinds: Vec<_> = events.iter().map(StreamEvent::kind).collect();
    assert_eq!(
        kinds,
        vec!["search_results", "content", "content", "metadata", "done"]
    );
}

#[tokio::test]
async fn test_answer_aggregated() {
    let server = setup_mock_server().await;
    mount_answer(&server).await;
    let cancel = CancellationToken::new();
    let client = client_for(&server);

    let response = client
        .answer()
        .answer(AnswerRequest::new("How do transformers work?"), &cancel)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.text(), Some("Transformers use self-attention."));
    assert_eq!(response.tx_id.as_deref(), Some("tx_ans"));
    assert_eq!(response.search_results.len(), 1);
    assert_eq!(
        response.search_results[0].url,
        "https://arxiv.org/abs/1706.03762"
    );

    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.stream_events.get("content"), Some(&2));
}

#[tokio::test]
async fn test_answer_error_status() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/answer")
        .respond_with(json_response(402, json!({"error": "Insufficient credits"})))
        .mount(&server)
        .await;
    let cancel = CancellationToken::new();

    let response = client_for(&server)
        .answer()
        .answer(AnswerRequest::new("How do transformers work?"), &cancel)
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("API error (HTTP 402): Insufficient credits")
    );
}
