pub mod config;
pub mod dispatch;
pub mod pool;
pub mod provider;

pub use config::{WorkerAppConfig, WorkerConfig};
pub use dispatch::{DispatchError, DispatchOutcome, process_job};
pub use pool::WorkerPool;
pub use provider::{Provider, ProviderClient, ProviderError, ProviderSubmission};
