use std::sync::Arc;

use anyhow::Context;
use common::store::{SeaGenerationStore, init_db};
use mq::{BrokerQueue, MqConfig, init_mq};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worker::{ProviderClient, WorkerAppConfig, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!(worker_id = %config.worker.id, "Worker starting");

    let provider =
        ProviderClient::new(&config.provider).context("Failed to build provider client")?;
    info!(callback_url = %provider.callback_url(), "Provider client ready");

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(SeaGenerationStore::new(db));

    let mq = init_mq(MqConfig::from(&config.mq))
        .await
        .context("Failed to initialize MQ")?;
    info!(
        queue_name = %config.mq.queue_name,
        max_attempts = config.mq.max_attempts,
        "MQ connected"
    );
    let queue = Arc::new(BrokerQueue::new(mq, config.mq.queue_name.clone()));

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    WorkerPool::new(queue, store, Arc::new(provider), config.worker.concurrency)
        .run(shutdown)
        .await;

    info!(worker_id = %config.worker.id, "Worker stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
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

    info!("Shutdown signal received, finishing in-flight jobs");
    shutdown.cancel();
}
