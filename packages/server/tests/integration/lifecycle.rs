use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::GenerationStatus;
use common::config::ProviderConfig;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use worker::{ProviderClient, WorkerPool};

use crate::common::{TestApp, routes};

type Captured = Arc<Mutex<Vec<Value>>>;

/// Provider stand-in that hands out sequential task ids.
async fn fake_provider() -> (String, Captured) {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/v1/jobs/createTask",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                let mut seen = sink.lock().unwrap();
                seen.push(body);
                let task_id = format!("task-{}", seen.len());
                (
                    StatusCode::OK,
                    Json(json!({"code": 200, "msg": "success", "data": {"taskId": task_id}})),
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), captured)
}

async fn start_worker(app: &TestApp, base_url: &str) -> CancellationToken {
    let provider = ProviderClient::new(&ProviderConfig {
        api_key: Some("test-key".into()),
        base_url: base_url.into(),
        public_base_url: Some(format!("http://{}", app.addr)),
        ..Default::default()
    })
    .expect("provider client");

    let shutdown = CancellationToken::new();
    let pool = WorkerPool::new(app.queue.clone(), app.store.clone(), Arc::new(provider), 2);
    tokio::spawn(pool.run(shutdown.clone()));
    shutdown
}

/// Poll until the generation has a provider job id.
async fn wait_for_dispatch(app: &TestApp, id: Uuid) -> String {
    for _ in 0..100 {
        if let Some(task_id) = app.stored(id).await.provider_job_id {
            return task_id;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("generation {id} was never dispatched");
}

#[tokio::test]
async fn image_generation_end_to_end() {
    let app = TestApp::spawn().await;
    let (base_url, captured) = fake_provider().await;
    let shutdown = start_worker(&app, &base_url).await;

    let id = app.create_image("a red fox in the snow").await;
    let task_id = wait_for_dispatch(&app, id).await;

    let polled = app.get(&routes::generation(id)).await;
    assert_eq!(polled.body["generation"]["status"], "processing");
    assert_eq!(polled.body["generation"]["providerJobId"], task_id.as_str());

    {
        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], "seedream/4.5-text-to-image");
        assert_eq!(
            requests[0]["callBackUrl"],
            format!("http://{}/api/webhook", app.addr)
        );
        assert_eq!(
            requests[0]["input"],
            json!({"prompt": "a red fox in the snow", "aspect_ratio": "1:1", "quality": "basic"})
        );
    }

    let res = app
        .post(
            routes::WEBHOOK,
            &json!({
                "code": 200,
                "data": {
                    "taskId": task_id,
                    "state": "success",
                    "resultJson": "{\"resultUrls\":[\"https://cdn.example/fox.png\"]}"
                }
            }),
        )
        .await;
    assert_eq!(res.status, 200);

    let done = app.get(&routes::generation(id)).await;
    assert_eq!(done.body["generation"]["status"], "completed");
    assert_eq!(done.body["generation"]["resultUrl"], "https://cdn.example/fox.png");

    shutdown.cancel();
}

#[tokio::test]
async fn video_generation_sends_video_input() {
    let app = TestApp::spawn().await;
    let (base_url, captured) = fake_provider().await;
    let shutdown = start_worker(&app, &base_url).await;

    let res = app
        .post(
            routes::GENERATIONS,
            &json!({
                "prompt": "waves at dusk",
                "mode": "video",
                "inputImageUrls": ["https://img.example/a.png"],
                "duration": 12,
                "generateAudio": true
            }),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();
    wait_for_dispatch(&app, id).await;

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "bytedance/seedance-1.5-pro");
    let input = &requests[0]["input"];
    assert_eq!(input["input_urls"], json!(["https://img.example/a.png"]));
    assert_eq!(input["duration"], "12");
    assert_eq!(input["aspect_ratio"], "16:9");
    assert_eq!(input["resolution"], "480p");
    assert_eq!(input["generate_audio"], true);

    shutdown.cancel();
}

#[tokio::test]
async fn provider_rejection_fails_generation() {
    let app = TestApp::spawn().await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let provider = Router::new().route(
        "/v1/jobs/createTask",
        post(|| async {
            (
                StatusCode::OK,
                Json(json!({"code": 422, "msg": "prompt rejected", "data": null})),
            )
        }),
    );
    tokio::spawn(async move {
        axum::serve(listener, provider).await.unwrap();
    });
    let shutdown = start_worker(&app, &format!("http://{addr}/v1")).await;

    let id = app.create_image("a red fox").await;

    let mut stored = app.stored(id).await;
    for _ in 0..100 {
        if stored.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        stored = app.stored(id).await;
    }

    assert_eq!(stored.status, GenerationStatus::Failed);
    assert!(
        stored
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("prompt rejected")),
        "unexpected error message: {:?}",
        stored.error_message
    );
    assert!(stored.provider_job_id.is_none());

    shutdown.cancel();
}
