use common::store::{GenerationStore, StoreError};
use common::{GenerationJob, GenerationPatch, GenerationStatus};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::provider::{Provider, ProviderError};

/// What `process_job` did with a job it handled without error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The provider accepted the task and its id is on the record.
    Submitted { provider_job_id: String },
    /// The record was already dispatched or finished; nothing was done.
    Skipped { status: GenerationStatus },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The job names a generation that does not exist. Redelivery cannot help.
    #[error("Generation {0} not found")]
    RecordMissing(Uuid),

    #[error("Store error: {0}")]
    Store(StoreError),

    /// Submission failed; the record has been marked failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl DispatchError {
    /// Whether the delivery should go back to the queue.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RecordMissing(_))
    }
}

fn store_err(id: Uuid) -> impl Fn(StoreError) -> DispatchError {
    move |e| match e {
        StoreError::NotFound(_) => DispatchError::RecordMissing(id),
        other => DispatchError::Store(other),
    }
}

/// Submit one generation to the provider.
///
/// Idempotent per generation: a redelivered job whose record is already
/// terminal or already carries a provider job id is a no-op. Completion is
/// not handled here; it arrives through the webhook.
#[instrument(skip_all, fields(generation_id = %job.generation_id, mode = %job.mode()))]
pub async fn process_job(
    job: &GenerationJob,
    store: &dyn GenerationStore,
    provider: &dyn Provider,
) -> Result<DispatchOutcome, DispatchError> {
    let id = job.generation_id;

    let current = store
        .get(id)
        .await
        .map_err(store_err(id))?
        .ok_or(DispatchError::RecordMissing(id))?;

    if current.status.is_terminal() || current.provider_job_id.is_some() {
        info!(status = %current.status, "Generation already dispatched, skipping");
        return Ok(DispatchOutcome::Skipped {
            status: current.status,
        });
    }

    let claimed = store
        .update_if(
            id,
            &[GenerationStatus::Pending, GenerationStatus::Processing],
            GenerationPatch::processing(),
        )
        .await
        .map_err(store_err(id))?;
    if !claimed.is_applied() {
        let status = claimed.generation().status;
        info!(status = %status, "Generation finished before dispatch, skipping");
        return Ok(DispatchOutcome::Skipped { status });
    }

    match provider.submit(job).await {
        Ok(submission) => {
            let recorded = store
                .update_if(
                    id,
                    &[GenerationStatus::Processing],
                    GenerationPatch::provider_job(&submission.provider_job_id),
                )
                .await
                .map_err(store_err(id))?;
            if !recorded.is_applied() {
                warn!(
                    provider_job_id = %submission.provider_job_id,
                    status = %recorded.generation().status,
                    "Record left processing before the provider job id was written"
                );
            }

            info!(
                provider_job_id = %submission.provider_job_id,
                provider_state = %submission.state,
                "Submitted generation to provider"
            );
            Ok(DispatchOutcome::Submitted {
                provider_job_id: submission.provider_job_id,
            })
        }
        Err(e) => {
            error!(error = %e, "Provider submission failed");
            let marked = store
                .update_if(
                    id,
                    &[GenerationStatus::Pending, GenerationStatus::Processing],
                    GenerationPatch::failed(e.to_string()),
                )
                .await
                .map_err(store_err(id))?;
            if !marked.is_applied() {
                warn!(
                    status = %marked.generation().status,
                    "Record already terminal, failure not recorded"
                );
            }
            Err(DispatchError::Provider(e))
        }
    }
}
