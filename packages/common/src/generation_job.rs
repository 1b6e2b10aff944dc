use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::Generation;
use crate::params::{Mode, ModeParams};

/// A generation job message sent to the worker queue.
///
/// A snapshot of what a worker needs to submit the generation. The stored
/// record stays the source of truth; this is only the delivery vehicle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationJob {
    /// ID of the generation being dispatched
    pub generation_id: Uuid,
    pub prompt: String,
    /// Provider model identifier
    pub model: String,
    /// Mode-specific parameters, tagged by `mode`
    #[serde(flatten)]
    pub params: ModeParams,
}

impl GenerationJob {
    pub fn mode(&self) -> Mode {
        self.params.mode()
    }
}

impl From<&Generation> for GenerationJob {
    fn from(generation: &Generation) -> Self {
        Self {
            generation_id: generation.id,
            prompt: generation.prompt.clone(),
            model: generation.model.clone(),
            params: generation.params.clone(),
        }
    }
}
