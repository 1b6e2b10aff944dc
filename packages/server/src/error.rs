use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::store::StoreError;
use serde::Serialize;

/// One rejected request field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Request field name, camelCase as sent by the client.
    #[schema(example = "duration")]
    pub field: String,
    #[schema(example = "Duration must be 4, 8, or 12 seconds")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_REQUEST`, `INVALID_WEBHOOK`, `NOT_FOUND`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_REQUEST")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid request data")]
    pub error: String,
    /// Field-level detail, present for request and webhook validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// The body could not be read as JSON of the expected shape.
    Validation(String),
    /// The body parsed but individual fields are invalid.
    InvalidRequest(Vec<FieldError>),
    /// A provider callback does not match the callback schema.
    InvalidWebhook(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    code: "VALIDATION_ERROR",
                    error: msg,
                    details: None,
                },
            ),
            AppError::InvalidRequest(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    code: "INVALID_REQUEST",
                    error: "Invalid request data".into(),
                    details: Some(fields),
                },
            ),
            AppError::InvalidWebhook(detail) => {
                tracing::warn!(error = %detail, "Rejected webhook payload");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        success: false,
                        code: "INVALID_WEBHOOK",
                        error: "Invalid webhook payload".into(),
                        details: Some(vec![FieldError::new("body", detail)]),
                    },
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    success: false,
                    code: "NOT_FOUND",
                    error: msg,
                    details: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        code: "INTERNAL_ERROR",
                        error: "Internal server error".into(),
                        details: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("Generation not found".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
