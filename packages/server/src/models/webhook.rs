use serde::Serialize;

/// Acknowledgement returned for every accepted callback.
#[derive(Serialize, utoipa::ToSchema)]
pub struct WebhookAck {
    #[schema(example = true)]
    pub success: bool,
}
