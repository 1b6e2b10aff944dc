use std::net::SocketAddr;
use std::sync::Arc;

use common::config::{DatabaseConfig, MqAppConfig, ProviderConfig};
use common::store::{GenerationStore, MemoryGenerationStore, UpdateOutcome};
use common::{Generation, GenerationPatch, GenerationStatus};
use mq::MemoryQueue;
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

use server::config::{AppConfig, CorsConfig, GenerationConfig, ServerConfig};
use server::state::AppState;

pub mod postgres;

pub mod routes {
    pub const GENERATIONS: &str = "/api/v1/generations";
    pub const WEBHOOK: &str = "/api/webhook";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn generation(id: impl std::fmt::Display) -> String {
        format!("/api/v1/generations/{id}")
    }
}

/// A running test server over in-memory storage and queue.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryGenerationStore>,
    pub queue: Arc<MemoryQueue>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig::default(),
        },
        database: DatabaseConfig::default(),
        mq: MqAppConfig::default(),
        provider: ProviderConfig {
            public_base_url: Some("https://app.example.com".into()),
            ..Default::default()
        },
        generation: GenerationConfig::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let store = Arc::new(MemoryGenerationStore::new());
        let queue = Arc::new(MemoryQueue::new(3));

        let state = AppState {
            config,
            store: store.clone(),
            queue: queue.clone(),
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            queue,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// POST a body verbatim, for malformed JSON cases.
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Create an image generation through the API and return its id.
    pub async fn create_image(&self, prompt: &str) -> Uuid {
        let res = self
            .post(routes::GENERATIONS, &serde_json::json!({"prompt": prompt}))
            .await;
        assert_eq!(res.status, 201, "create failed: {}", res.text);
        res.id()
    }

    /// Move a generation to `processing` with a provider job id, as the
    /// worker does on a successful submission.
    pub async fn mark_dispatched(&self, id: Uuid, task_id: &str) -> Generation {
        self.store
            .update_if(id, &[GenerationStatus::Pending], GenerationPatch::processing())
            .await
            .expect("mark processing");
        match self
            .store
            .update_if(
                id,
                &[GenerationStatus::Processing],
                GenerationPatch::provider_job(task_id),
            )
            .await
            .expect("record provider job")
        {
            UpdateOutcome::Applied(g) => g,
            UpdateOutcome::Skipped(g) => panic!("dispatch skipped, status {}", g.status),
        }
    }

    pub async fn stored(&self, id: Uuid) -> Generation {
        self.store
            .get(id)
            .await
            .expect("store get")
            .expect("generation exists")
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// Id of the generation in a create or get response.
    pub fn id(&self) -> Uuid {
        self.body["generation"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("no generation id in: {}", self.text))
    }

    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn detail_fields(&self) -> Vec<&str> {
        self.body["details"]
            .as_array()
            .map(|a| a.iter().filter_map(|d| d["field"].as_str()).collect())
            .unwrap_or_default()
    }
}
