//! Integration tests for batches

use super::*;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use valyu_client::{AddBatchTasksRequest, BatchStatus, BatchTaskInput, PollConfig};
use wiremock::matchers::body_json;

fn batch_body(status: &str, completed: u32) -> serde_json::Value {
    json!({
        "success": true,
        "batch": {
            "batch_id": "b_it",
            "status": status,
            "counts": {"total": 2, "completed": completed, "running": 2 - completed}
        }
    })
}

#[tokio::test]
async fn test_add_tasks_and_wait() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/deepresearch/batches/b_it/tasks")
        .and(body_json(json!({
            "tasks": [{"query": "Copper demand 2030"}, {"id": "t2", "query": "Nickel supply risks"}]
        })))
        .respond_with(json_response(
            200,
            json!({"success": true, "batch_id": "b_it", "added": 2}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    mock_with_auth("GET", "/deepresearch/batches/b_it")
        .respond_with(json_response(200, batch_body("processing", 1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    mock_with_auth("GET", "/deepresearch/batches/b_it")
        .respond_with(json_response(200, batch_body("completed", 2)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let added = client
        .batch()
        .add_tasks(
            "b_it",
            AddBatchTasksRequest::new(vec![
                BatchTaskInput::new("Copper demand 2030"),
                BatchTaskInput::new("Nickel supply risks").id("t2"),
            ]),
        )
        .await
        .unwrap();
    assert!(added.success);
    assert_eq!(added.added, 2);

    let cancel = CancellationToken::new();
    let batch = client
        .batch()
        .wait_for_completion(
            "b_it",
            PollConfig::batch().with_interval(Duration::from_millis(10)),
            &cancel,
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.counts.completed, 2);
}
