pub use broccoli_queue::{
    brokers::broker::BrokerMessage,
    error::BroccoliError,
    queue::{BroccoliQueue, RetryStrategy},
};

use crate::error::MqError;

pub type MqQueue = BroccoliQueue;

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
    /// Deliveries per message before the broker stops retrying it.
    pub max_attempts: u8,
}

impl From<&common::config::MqAppConfig> for MqConfig {
    fn from(config: &common::config::MqAppConfig) -> Self {
        Self {
            url: config.url.clone(),
            pool_size: config.pool_size,
            max_attempts: config.max_attempts,
        }
    }
}

pub async fn init_mq(config: MqConfig) -> Result<MqQueue, MqError> {
    BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .failed_message_retry_strategy(
            RetryStrategy::new()
                .with_attempts(config.max_attempts)
                .retry_failed(true),
        )
        .build()
        .await
        .map_err(MqError::from)
}
