use common::GenerationStatus;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_image_generation_with_defaults() {
    let app = TestApp::spawn().await;

    let res = app
        .post(routes::GENERATIONS, &json!({"prompt": "a red fox in the snow"}))
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["generation"]["status"], "pending");
    assert_eq!(res.body["generation"]["mode"], "image");
    assert_eq!(res.body["generation"]["prompt"], "a red fox in the snow");

    let stored = app.stored(res.id()).await;
    assert_eq!(stored.model, "seedream/4.5-text-to-image");
    assert_eq!(stored.params.aspect_ratio().map(|r| r.as_str()), Some("1:1"));
    assert!(stored.queue_job_id.is_some());
    assert_eq!(app.queue.len(), 1);
}

#[tokio::test]
async fn create_video_generation_applies_defaults() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({"prompt": "waves at dusk", "mode": "video", "duration": 8}),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["generation"]["mode"], "video");

    let get = app.get(&routes::generation(res.id())).await;
    assert_eq!(get.status, 200);
    let generation = &get.body["generation"];
    assert_eq!(generation["model"], "bytedance/seedance-1.5-pro");
    assert_eq!(generation["aspectRatio"], "16:9");
    assert_eq!(generation["resolution"], "480p");
    assert_eq!(generation["fixedLens"], false);
    assert_eq!(generation["duration"], 8);
    assert_eq!(generation["status"], "pending");
}

#[tokio::test]
async fn invalid_duration_creates_nothing() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({"prompt": "waves", "mode": "video", "duration": 10}),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.error_code(), "INVALID_REQUEST");
    assert_eq!(res.body["error"], "Invalid request data");
    assert_eq!(res.detail_fields(), vec!["duration"]);
    assert!(app.store.is_empty());
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn every_invalid_field_is_reported() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({
                "prompt": "",
                "mode": "video",
                "aspectRatio": "2:1",
                "inputImageUrls": ["https://a/1.png", "ftp://b/2.png", "https://c/3.png"]
            }),
        )
        .await;

    assert_eq!(res.status, 400);
    let fields = res.detail_fields();
    assert!(fields.contains(&"prompt"));
    assert!(fields.contains(&"aspectRatio"));
    assert!(fields.contains(&"inputImageUrls"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn video_fields_rejected_in_image_mode() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({"prompt": "a fox", "duration": 4, "generateAudio": true}),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.detail_fields(), vec!["duration", "generateAudio"]);
}

#[tokio::test]
async fn wrong_field_types_are_reported_per_field() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({"prompt": "waves", "mode": "video", "duration": "8", "fixedLens": "yes"}),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "INVALID_REQUEST");
    assert_eq!(res.detail_fields(), vec!["duration", "fixedLens"]);
    assert!(app.store.is_empty());
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = TestApp::spawn().await;

    let res = app.post_raw(routes::GENERATIONS, "{not json").await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn enqueue_failure_marks_generation_failed() {
    let app = TestApp::spawn().await;
    app.queue.close();

    let res = app
        .post(routes::GENERATIONS, &json!({"prompt": "a red fox"}))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.error_code(), "INTERNAL_ERROR");
    assert_eq!(res.body["error"], "Internal server error");

    let list = app.get(routes::GENERATIONS).await;
    let generations = list.body["generations"].as_array().unwrap();
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0]["status"], "failed");
    assert_eq!(generations[0]["errorMessage"], "Failed to enqueue generation");
}

#[tokio::test]
async fn get_unknown_generation_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::generation(uuid::Uuid::now_v7())).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.error_code(), "NOT_FOUND");
    assert_eq!(res.body["error"], "Generation not found");
}

#[tokio::test]
async fn list_is_newest_first_and_limited() {
    let app = TestApp::spawn().await;
    let first = app.create_image("first").await;
    let second = app.create_image("second").await;
    let third = app.create_image("third").await;

    let res = app.get(routes::GENERATIONS).await;
    assert_eq!(res.status, 200);
    let ids: Vec<&str> = res.body["generations"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["id"].as_str())
        .collect();
    assert_eq!(
        ids,
        vec![third.to_string(), second.to_string(), first.to_string()]
    );

    let limited = app.get(&format!("{}?limit=2", routes::GENERATIONS)).await;
    assert_eq!(limited.body["generations"].as_array().unwrap().len(), 2);
    assert_eq!(limited.body["generations"][0]["id"], third.to_string());

    let rejected = app.get(&format!("{}?limit=0", routes::GENERATIONS)).await;
    assert_eq!(rejected.status, 400);
    assert_eq!(rejected.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn new_generation_starts_pending_without_results() {
    let app = TestApp::spawn().await;
    let id = app.create_image("a red fox").await;

    let res = app.get(&routes::generation(id)).await;
    let generation = &res.body["generation"];
    assert_eq!(generation["status"], GenerationStatus::Pending.as_str());
    assert!(generation["providerJobId"].is_null());
    assert!(generation["resultUrl"].is_null());
    assert!(generation["errorMessage"].is_null());
}

#[tokio::test]
async fn openapi_document_lists_endpoints() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/generations")));
    assert!(paths.contains_key("/api/webhook"));
}
