use common::store::{GenerationStore, UpdateOutcome};
use common::{GenerationPatch, GenerationStatus};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::payload::WebhookPayload;
use crate::error::AppError;

/// Result of reconciling one callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The record moved to the given status.
    Applied {
        generation_id: Uuid,
        status: GenerationStatus,
    },
    /// Nothing changed: the record is terminal, or the callback would move it
    /// backward. Still acknowledged as success.
    Unchanged {
        generation_id: Uuid,
        status: GenerationStatus,
    },
}

/// Apply a provider callback to the generation it refers to.
///
/// Never creates records. Terminal records are left untouched, so repeated
/// deliveries of the same terminal callback are harmless.
#[instrument(skip_all, fields(task_id = %payload.data.task_id, state = %payload.data.state))]
pub async fn handle_webhook(
    store: &dyn GenerationStore,
    payload: &WebhookPayload,
) -> Result<WebhookOutcome, AppError> {
    let data = &payload.data;

    let Some(generation) = store.find_by_provider_job_id(&data.task_id).await? else {
        warn!("No generation for provider task");
        return Err(AppError::NotFound("Generation not found".into()));
    };
    let generation_id = generation.id;

    if payload.code != 200 {
        warn!(
            %generation_id,
            code = payload.code,
            msg = payload.msg.as_deref().unwrap_or_default(),
            "Callback carries a non-200 code"
        );
    }

    let target = data.target_status();
    let unchanged = WebhookOutcome::Unchanged {
        generation_id,
        status: generation.status,
    };

    if generation.status.is_terminal() {
        info!(
            %generation_id,
            status = %generation.status,
            target = %target,
            "Generation already terminal, ignoring callback"
        );
        return Ok(unchanged);
    }
    if target == GenerationStatus::Pending || !generation.status.can_transition_to(target) {
        info!(
            %generation_id,
            status = %generation.status,
            target = %target,
            "Callback would not advance generation, ignoring"
        );
        return Ok(unchanged);
    }

    let patch = match target {
        GenerationStatus::Completed => {
            let result_url = data.result_url().unwrap_or_else(|e| {
                warn!(%generation_id, error = %e, "Failed to parse resultJson");
                None
            });
            if result_url.is_none() {
                warn!(%generation_id, "Successful callback carries no result URL");
            }
            GenerationPatch::completed(result_url)
        }
        GenerationStatus::Failed => GenerationPatch::failed(data.failure_message()),
        _ => GenerationPatch::processing(),
    };

    let outcome = store
        .update_if(generation_id, &GenerationStatus::sources_of(target), patch)
        .await?;

    match outcome {
        UpdateOutcome::Applied(updated) => {
            info!(%generation_id, status = %updated.status, "Updated generation from callback");
            Ok(WebhookOutcome::Applied {
                generation_id,
                status: updated.status,
            })
        }
        UpdateOutcome::Skipped(current) => {
            info!(
                %generation_id,
                status = %current.status,
                "Generation changed concurrently, callback ignored"
            );
            Ok(WebhookOutcome::Unchanged {
                generation_id,
                status: current.status,
            })
        }
    }
}
