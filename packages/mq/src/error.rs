use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqError {
    /// The broker refused or failed an operation.
    #[error("Broker error: {0}")]
    Broker(String),

    /// The queue has been closed and holds nothing more to deliver.
    #[error("Queue closed")]
    Closed,
}

impl From<broccoli_queue::error::BroccoliError> for MqError {
    fn from(e: broccoli_queue::error::BroccoliError) -> Self {
        MqError::Broker(e.to_string())
    }
}
