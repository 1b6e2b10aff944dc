use std::sync::Arc;

use common::store::GenerationStore;
use mq::JobQueue;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn GenerationStore>,
    pub queue: Arc<dyn JobQueue>,
}
