//! Outbound calls to the external generation provider.
//!
//! [`Provider`] is the seam the dispatch step depends on; [`ProviderClient`]
//! is the HTTP implementation.

mod client;

use async_trait::async_trait;
use common::{GenerationJob, GenerationStatus};
use thiserror::Error;

pub use client::ProviderClient;

/// What the provider handed back for an accepted task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSubmission {
    /// Correlation key the provider will quote in its callback.
    pub provider_job_id: String,
    /// The provider's own view of the task right after submission.
    pub state: GenerationStatus,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The client cannot be built from the given settings.
    #[error("Provider is not configured: {0}")]
    Config(String),

    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Provider API error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body is not the expected JSON envelope.
    #[error("Provider returned a malformed response: {0}")]
    MalformedResponse(String),

    /// The envelope parsed but reports failure or lacks a task id.
    #[error("Provider rejected the task (code {code}): {message}")]
    Application { code: i64, message: String },
}

/// Submits generation jobs to the provider.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn submit(&self, job: &GenerationJob) -> Result<ProviderSubmission, ProviderError>;
}
