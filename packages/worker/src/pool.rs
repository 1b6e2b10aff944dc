use std::sync::Arc;
use std::time::Duration;

use common::store::GenerationStore;
use mq::{Delivery, JobQueue, MqError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{DispatchError, process_job};
use crate::provider::Provider;

/// Pause after a failed dequeue before asking the queue again.
const DEQUEUE_BACKOFF: Duration = Duration::from_secs(1);

/// A fixed number of slots, each looping dequeue, process, settle.
///
/// A failure on one generation is settled and logged; it never stops a slot.
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn GenerationStore>,
    provider: Arc<dyn Provider>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn GenerationStore>,
        provider: Arc<dyn Provider>,
        concurrency: usize,
    ) -> Self {
        Self {
            queue,
            store,
            provider,
            concurrency: concurrency.max(1),
        }
    }

    /// Run until `shutdown` is cancelled or the queue closes.
    ///
    /// Cancellation abandons pending dequeues; a job already being processed
    /// is finished and settled first.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(concurrency = self.concurrency, "Worker pool starting");

        let mut slots = JoinSet::new();
        for slot in 0..self.concurrency {
            let queue = Arc::clone(&self.queue);
            let store = Arc::clone(&self.store);
            let provider = Arc::clone(&self.provider);
            let shutdown = shutdown.clone();
            slots.spawn(async move { run_slot(slot, queue, store, provider, shutdown).await });
        }

        while let Some(joined) = slots.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker slot panicked");
            }
        }

        info!("Worker pool stopped");
    }
}

async fn run_slot(
    slot: usize,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn GenerationStore>,
    provider: Arc<dyn Provider>,
    shutdown: CancellationToken,
) {
    debug!(slot, "Worker slot started");

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = queue.dequeue() => next,
        };

        match next {
            Ok(delivery) => {
                handle_delivery(queue.as_ref(), store.as_ref(), provider.as_ref(), delivery).await
            }
            Err(MqError::Closed) => break,
            Err(e) => {
                error!(slot, error = %e, "Failed to dequeue job");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(DEQUEUE_BACKOFF) => {}
                }
            }
        }
    }

    debug!(slot, "Worker slot stopped");
}

async fn handle_delivery(
    queue: &dyn JobQueue,
    store: &dyn GenerationStore,
    provider: &dyn Provider,
    delivery: Delivery,
) {
    let generation_id = delivery.job.generation_id;
    let handle = delivery.handle.clone();
    let attempt = delivery.attempt;

    let retry = match process_job(&delivery.job, store, provider).await {
        Ok(_) => false,
        Err(e @ DispatchError::RecordMissing(_)) => {
            error!(%generation_id, %handle, error = %e, "Dropping job for unknown generation");
            false
        }
        Err(e) => {
            warn!(%generation_id, %handle, attempt, error = %e, "Job failed, returning to queue");
            e.is_retryable()
        }
    };

    let settled = if retry {
        queue.nack(delivery).await
    } else {
        queue.ack(delivery).await
    };
    if let Err(e) = settled {
        error!(%generation_id, %handle, error = %e, "Failed to settle delivery");
    }
}
