use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::store::UpdateOutcome;
use common::{GenerationJob, GenerationPatch, GenerationStatus};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::generation::*;
use crate::state::AppState;

/// Stored on the record when the queue refuses the job.
pub const ENQUEUE_FAILED: &str = "Failed to enqueue generation";

#[utoipa::path(
    post,
    path = "/",
    tag = "Generations",
    operation_id = "createGeneration",
    summary = "Request an image or video generation",
    description = "Validates the request, stores a `pending` generation and queues it for dispatch to the provider. Returns immediately; poll `GET /api/v1/generations/{id}` for progress. Video-only fields are rejected in image mode.",
    request_body = CreateGenerationRequest,
    responses(
        (status = 201, description = "Generation accepted", body = CreateGenerationResponse),
        (status = 400, description = "Invalid request (VALIDATION_ERROR, INVALID_REQUEST)", body = ErrorBody),
        (status = 500, description = "Storage or queue failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(mode = payload.mode_name().unwrap_or("image")))]
pub async fn create_generation(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGenerationRequest>,
) -> Result<(StatusCode, Json<CreateGenerationResponse>), AppError> {
    let new = validate_create_generation(&payload, &state.config.provider)?;

    let generation = state.store.create(new).await?;
    let generation_id = generation.id;
    info!(%generation_id, model = %generation.model, "Generation created");

    let job = GenerationJob::from(&generation);
    let handle = match state.queue.enqueue(&job).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(%generation_id, error = %e, "Failed to enqueue generation");
            if let Err(mark_err) = state
                .store
                .update_if(
                    generation_id,
                    &[GenerationStatus::Pending],
                    GenerationPatch::failed(ENQUEUE_FAILED),
                )
                .await
            {
                error!(%generation_id, error = %mark_err, "Failed to mark generation as failed");
            }
            return Err(AppError::Internal(format!("enqueue failed: {e}")));
        }
    };

    // The worker may already have picked the job up, so accept any status.
    match state
        .store
        .update_if(
            generation_id,
            GenerationStatus::ALL,
            GenerationPatch::queue_job(handle.0.clone()),
        )
        .await
    {
        Ok(UpdateOutcome::Applied(_)) => {
            info!(%generation_id, queue_job_id = %handle, "Generation queued")
        }
        Ok(UpdateOutcome::Skipped(_)) => {}
        Err(e) => warn!(%generation_id, error = %e, "Failed to record queue job id"),
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateGenerationResponse {
            success: true,
            generation: GenerationSummary {
                id: generation.id,
                status: generation.status,
                prompt: generation.prompt.clone(),
                mode: generation.mode(),
            },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Generations",
    operation_id = "listGenerations",
    summary = "List recent generations",
    description = "Returns the most recent generations, newest first.",
    params(GenerationListQuery),
    responses(
        (status = 200, description = "Recent generations", body = GenerationListResponse),
        (status = 400, description = "Invalid limit (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_generations(
    State(state): State<AppState>,
    Query(query): Query<GenerationListQuery>,
) -> Result<Json<GenerationListResponse>, AppError> {
    let limit = resolve_list_limit(&query, state.config.generation.list_limit)?;

    let generations = state.store.list_recent(limit).await?;

    Ok(Json(GenerationListResponse {
        success: true,
        generations: generations.into_iter().map(GenerationDto::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Generations",
    operation_id = "getGeneration",
    summary = "Get a generation",
    description = "Returns the current state of one generation, including `resultUrl` once completed or `errorMessage` once failed.",
    params(("id" = Uuid, Path, description = "Generation ID")),
    responses(
        (status = 200, description = "Generation found", body = GenerationResponse),
        (status = 400, description = "Malformed ID", body = ErrorBody),
        (status = 404, description = "Generation not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationResponse>, AppError> {
    let generation = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Generation not found".into()))?;

    Ok(Json(GenerationResponse {
        success: true,
        generation: GenerationDto::from(generation),
    }))
}
