use common::GenerationStatus;
use serde_json::json;

use crate::common::{TestApp, routes};

fn success(task_id: &str, url: &str) -> serde_json::Value {
    json!({
        "code": 200,
        "msg": "success",
        "data": {
            "taskId": task_id,
            "state": "success",
            "resultJson": format!("{{\"resultUrls\":[\"{url}\"]}}")
        }
    })
}

#[tokio::test]
async fn success_callback_completes_generation() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-1").await;

    let res = app
        .post(routes::WEBHOOK, &success("task-1", "https://cdn.example/out.png"))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!({"success": true}));

    let get = app.get(&routes::generation(id)).await;
    assert_eq!(get.body["generation"]["status"], "completed");
    assert_eq!(get.body["generation"]["resultUrl"], "https://cdn.example/out.png");
    assert_eq!(get.body["generation"]["providerJobId"], "task-1");
}

#[tokio::test]
async fn duplicate_success_callback_is_idempotent() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-1").await;

    let body = success("task-1", "https://cdn.example/out.png");
    assert_eq!(app.post(routes::WEBHOOK, &body).await.status, 200);
    let after_first = app.stored(id).await;

    let again = app.post(routes::WEBHOOK, &body).await;
    assert_eq!(again.status, 200);
    assert_eq!(again.body["success"], true);
    assert_eq!(app.stored(id).await, after_first);
}

#[tokio::test]
async fn failure_callback_records_provider_message() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-2").await;

    let res = app
        .post(
            routes::WEBHOOK,
            &json!({
                "code": 200,
                "data": {
                    "taskId": "task-2",
                    "state": "fail",
                    "failCode": "400",
                    "failMsg": "NSFW content"
                }
            }),
        )
        .await;
    assert_eq!(res.status, 200);

    let stored = app.stored(id).await;
    assert_eq!(stored.status, GenerationStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some("NSFW content"));
    assert!(stored.result_url.is_none());
}

#[tokio::test]
async fn late_callback_does_not_override_terminal_state() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-3").await;

    app.post(routes::WEBHOOK, &success("task-3", "https://cdn.example/a.png"))
        .await;
    let res = app
        .post(
            routes::WEBHOOK,
            &json!({"code": 200, "data": {"taskId": "task-3", "state": "fail", "failMsg": "late"}}),
        )
        .await;
    assert_eq!(res.status, 200);

    let stored = app.stored(id).await;
    assert_eq!(stored.status, GenerationStatus::Completed);
    assert_eq!(stored.result_url.as_deref(), Some("https://cdn.example/a.png"));
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn unknown_task_is_not_found_and_creates_nothing() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-1").await;

    let res = app
        .post(routes::WEBHOOK, &success("task-unknown", "https://cdn.example/x.png"))
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["error"], "Generation not found");
    assert_eq!(app.store.len(), 1);
    assert_eq!(app.stored(id).await.status, GenerationStatus::Processing);
}

#[tokio::test]
async fn payload_without_task_id_is_rejected() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;
    app.mark_dispatched(id, "task-1").await;

    let res = app
        .post(routes::WEBHOOK, &json!({"code": 200, "data": {"state": "success"}}))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "INVALID_WEBHOOK");
    assert_eq!(res.body["error"], "Invalid webhook payload");
    assert_eq!(app.stored(id).await.status, GenerationStatus::Processing);
}

#[tokio::test]
async fn non_json_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.post_raw(routes::WEBHOOK, "<xml/>").await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "INVALID_WEBHOOK");
}
