use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StoreError;
use super::traits::{GenerationStore, UpdateOutcome};
use crate::generation::{Generation, GenerationPatch, NewGeneration};
use crate::generation_status::GenerationStatus;

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, Generation>,
    /// Insertion order, oldest first.
    order: Vec<Uuid>,
}

/// In-process generation store.
///
/// Every operation takes one lock, which makes `update_if` trivially atomic.
/// Used by tests and single-process deployments.
#[derive(Default)]
pub struct MemoryGenerationStore {
    inner: Mutex<Inner>,
}

impl MemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GenerationStore for MemoryGenerationStore {
    async fn create(&self, new: NewGeneration) -> Result<Generation, StoreError> {
        let generation = new.into_generation();
        let mut inner = self.lock()?;
        inner.order.push(generation.id);
        inner.records.insert(generation.id, generation.clone());
        Ok(generation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Generation>, StoreError> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn find_by_provider_job_id(&self, key: &str) -> Result<Option<Generation>, StoreError> {
        Ok(self
            .lock()?
            .records
            .values()
            .find(|g| g.provider_job_id.as_deref() == Some(key))
            .cloned())
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<Generation>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit as usize)
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }

    async fn update_if(
        &self,
        id: Uuid,
        expected: &[GenerationStatus],
        patch: GenerationPatch,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut inner = self.lock()?;

        if let Some(key) = patch.provider_job_id() {
            let taken = inner
                .records
                .values()
                .any(|g| g.id != id && g.provider_job_id.as_deref() == Some(key));
            if taken {
                return Err(StoreError::Conflict(format!(
                    "provider job id '{key}' already belongs to another generation"
                )));
            }
        }

        let generation = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !expected.contains(&generation.status) {
            return Ok(UpdateOutcome::Skipped(generation.clone()));
        }

        patch.apply_to(generation);
        Ok(UpdateOutcome::Applied(generation.clone()))
    }
}
