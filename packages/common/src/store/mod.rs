mod error;
mod traits;

pub mod memory;
#[cfg(feature = "sea-orm")]
pub mod entity;
#[cfg(feature = "sea-orm")]
pub mod sea;

pub use error::StoreError;
pub use memory::MemoryGenerationStore;
#[cfg(feature = "sea-orm")]
pub use sea::{SeaGenerationStore, init_db};
pub use traits::{GenerationStore, UpdateOutcome};
