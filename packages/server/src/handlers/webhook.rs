use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::webhook::WebhookAck;
use crate::state::AppState;
use crate::webhook::{WebhookPayload, handle_webhook};

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    operation_id = "receiveProviderWebhook",
    summary = "Provider completion callback",
    description = "Called by the provider when a task changes state. Moves the matching generation to `completed` or `failed`. Callbacks for generations that are already terminal are acknowledged without changes.",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Callback accepted", body = WebhookAck),
        (status = 400, description = "Body does not match the callback schema (INVALID_WEBHOOK)", body = ErrorBody),
        (status = 404, description = "No generation for taskId (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidWebhook(e.to_string()))?;

    handle_webhook(state.store.as_ref(), &payload).await?;

    Ok(Json(WebhookAck { success: true }))
}
