use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation_status::GenerationStatus;
use crate::params::{Mode, ModeParams};

/// A single image or video generation and everything known about its progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub id: Uuid,
    pub prompt: String,
    pub model: String,
    pub params: ModeParams,
    pub status: GenerationStatus,
    /// Correlation key handed out by the provider on submission.
    pub provider_job_id: Option<String>,
    /// Handle the job queue returned on enqueue.
    pub queue_job_id: Option<String>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Generation {
    pub fn mode(&self) -> Mode {
        self.params.mode()
    }
}

/// Validated input for creating a generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGeneration {
    pub prompt: String,
    pub model: String,
    pub params: ModeParams,
}

impl NewGeneration {
    /// Materialize the record as intake creates it: fresh id, `Pending`.
    pub fn into_generation(self) -> Generation {
        let now = Utc::now();
        Generation {
            id: Uuid::now_v7(),
            prompt: self.prompt,
            model: self.model,
            params: self.params,
            status: GenerationStatus::Pending,
            provider_job_id: None,
            queue_job_id: None,
            result_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update to a generation.
///
/// Built only through the constructors below so that a result URL can only
/// travel with `Completed` and an error message only with `Failed`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationPatch {
    status: Option<GenerationStatus>,
    provider_job_id: Option<String>,
    queue_job_id: Option<String>,
    result_url: Option<String>,
    error_message: Option<String>,
}

impl GenerationPatch {
    pub fn processing() -> Self {
        Self {
            status: Some(GenerationStatus::Processing),
            ..Default::default()
        }
    }

    pub fn provider_job(provider_job_id: impl Into<String>) -> Self {
        Self {
            provider_job_id: Some(provider_job_id.into()),
            ..Default::default()
        }
    }

    pub fn queue_job(queue_job_id: impl Into<String>) -> Self {
        Self {
            queue_job_id: Some(queue_job_id.into()),
            ..Default::default()
        }
    }

    pub fn completed(result_url: Option<String>) -> Self {
        Self {
            status: Some(GenerationStatus::Completed),
            result_url,
            ..Default::default()
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: Some(GenerationStatus::Failed),
            error_message: Some(error_message.into()),
            ..Default::default()
        }
    }

    pub fn status(&self) -> Option<GenerationStatus> {
        self.status
    }

    pub fn provider_job_id(&self) -> Option<&str> {
        self.provider_job_id.as_deref()
    }

    pub fn queue_job_id(&self) -> Option<&str> {
        self.queue_job_id.as_deref()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Apply the patch to an in-memory record, bumping `updated_at`.
    pub fn apply_to(&self, generation: &mut Generation) {
        if let Some(status) = self.status {
            generation.status = status;
        }
        if let Some(ref id) = self.provider_job_id {
            generation.provider_job_id = Some(id.clone());
        }
        if let Some(ref id) = self.queue_job_id {
            generation.queue_job_id = Some(id.clone());
        }
        if let Some(ref url) = self.result_url {
            generation.result_url = Some(url.clone());
        }
        if let Some(ref message) = self.error_message {
            generation.error_message = Some(message.clone());
        }
        generation.updated_at = Utc::now();
    }
}
