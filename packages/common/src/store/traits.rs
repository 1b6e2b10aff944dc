use async_trait::async_trait;
use uuid::Uuid;

use super::error::StoreError;
use crate::generation::{Generation, GenerationPatch, NewGeneration};
use crate::generation_status::GenerationStatus;

/// Result of a conditional update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record was in an expected status and the patch was written.
    Applied(Generation),
    /// The record was in some other status; it is returned untouched.
    Skipped(Generation),
}

impl UpdateOutcome {
    pub fn generation(&self) -> &Generation {
        match self {
            Self::Applied(g) | Self::Skipped(g) => g,
        }
    }

    pub fn into_generation(self) -> Generation {
        match self {
            Self::Applied(g) | Self::Skipped(g) => g,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Keyed storage for generation records.
///
/// Holds no business rules beyond the compare-and-set in [`update_if`]:
/// callers decide which statuses a write is valid from.
///
/// [`update_if`]: GenerationStore::update_if
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Persist a new record and return it as stored.
    async fn create(&self, new: NewGeneration) -> Result<Generation, StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<Generation>, StoreError>;

    /// Fetch the record that owns a provider correlation key.
    async fn find_by_provider_job_id(&self, key: &str) -> Result<Option<Generation>, StoreError>;

    /// Newest records first, at most `limit`.
    async fn list_recent(&self, limit: u64) -> Result<Vec<Generation>, StoreError>;

    /// Write `patch` only while the record's status is one of `expected`.
    ///
    /// The check and the write are atomic per record. Returns
    /// [`StoreError::NotFound`] if the record does not exist.
    async fn update_if(
        &self,
        id: Uuid,
        expected: &[GenerationStatus],
        patch: GenerationPatch,
    ) -> Result<UpdateOutcome, StoreError>;
}
