use std::sync::Arc;

use anyhow::Context;
use common::store::{SeaGenerationStore, init_db};
use mq::{BrokerQueue, MqConfig, init_mq};
use server::build_router;
use server::config::AppConfig;
use server::state::AppState;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    info!(
        callback_url = ?config.provider.callback_url(),
        image_model = %config.provider.image_model,
        video_model = %config.provider.video_model,
        "Config loaded"
    );

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    let mq = init_mq(MqConfig::from(&config.mq))
        .await
        .context("Failed to initialize MQ")?;
    info!(queue_name = %config.mq.queue_name, "MQ connected");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        store: Arc::new(SeaGenerationStore::new(db)),
        queue: Arc::new(BrokerQueue::new(mq, config.mq.queue_name.clone())),
        config,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
