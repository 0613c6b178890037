//! Integration tests for deep research tasks

use super::*;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use valyu_client::{DeepResearchCreateRequest, DeepResearchStatus, PollConfig};
use wiremock::matchers::{body_partial_json, query_param};

fn status_body(status: &str, step: u32) -> serde_json::Value {
    json!({
        "success": true,
        "deepresearch_id": "dr_it",
        "status": status,
        "progress": {"current_step": step, "total_steps": 3},
        "output": if status == "completed" { json!("# Report") } else { json!(null) }
    })
}

#[tokio::test]
async fn test_create_then_wait() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/deepresearch/tasks")
        .and(body_partial_json(json!({"query": "Grid-scale storage outlook", "mode": "fast"})))
        .respond_with(json_response(
            200,
            json!({"success": true, "deepresearch_id": "dr_it", "status": "queued"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    mock_with_auth("GET", "/deepresearch/tasks/dr_it/status")
        .respond_with(json_response(200, status_body("running", 1)))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    mock_with_auth("GET", "/deepresearch/tasks/dr_it/status")
        .respond_with(json_response(200, status_body("completed", 3)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created = client
        .deep_research()
        .create(DeepResearchCreateRequest::new("Grid-scale storage outlook"))
        .await
        .unwrap();
    assert_eq!(created.deepresearch_id.as_deref(), Some("dr_it"));

    let cancel = CancellationToken::new();
    let mut checks = 0;
    let status = client
        .deep_research()
        .wait(
            "dr_it",
            PollConfig::deep_research().with_interval(Duration::from_millis(10)),
            &cancel,
            |_| checks += 1,
        )
        .await
        .unwrap();

    assert_eq!(status.status, Some(DeepResearchStatus::Completed));
    assert_eq!(status.output, Some(json!("# Report")));
    assert_eq!(checks, 3);
}

#[tokio::test]
async fn test_wait_surfaces_error_status() {
    let server = setup_mock_server().await;

    mock_with_auth("GET", "/deepresearch/tasks/dr_gone/status")
        .respond_with(json_response(404, json!({"error": "Task not found"})))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let result = client_for(&server)
        .deep_research()
        .wait(
            "dr_gone",
            PollConfig::deep_research().with_interval(Duration::from_millis(10)),
            &cancel,
            |_| {},
        )
        .await;

    match result {
        Err(valyu_client::ValyuError::Api {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, 404);
            assert_eq!(message, "Task not found");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_assets_with_token_skip_api_key() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/deepresearch/tasks/dr_it/assets/report.pdf"))
        .and(query_param("token", "share-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let assets = client_for(&server)
        .deep_research()
        .get_assets("dr_it", "report.pdf", Some("share-token"))
        .await
        .unwrap();

    assert!(assets.success);
    assert_eq!(assets.data, b"%PDF-1.7");
    assert_eq!(assets.content_type.as_deref(), Some("application/pdf"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("x-api-key"));
}
