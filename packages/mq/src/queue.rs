use std::fmt;

use async_trait::async_trait;
use common::GenerationJob;

use crate::error::MqError;
use crate::models::BrokerMessage;

/// Opaque identifier the queue assigns to an enqueued job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-specific token needed to settle a delivery.
pub(crate) enum Receipt {
    Broker(Box<BrokerMessage<GenerationJob>>),
    Memory,
}

/// One delivery of a job to one consumer.
///
/// Owned by exactly one consumer until it is passed back through
/// [`JobQueue::ack`] or [`JobQueue::nack`].
pub struct Delivery {
    pub job: GenerationJob,
    pub handle: JobHandle,
    /// 1 on first delivery, incremented on every redelivery.
    pub attempt: u32,
    pub(crate) receipt: Receipt,
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("job", &self.job)
            .field("handle", &self.handle)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

/// At-least-once channel carrying generation jobs from intake to workers.
///
/// A job that is dequeued but never settled (the consumer crashed) is
/// eventually redelivered, so consumers must be idempotent.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Durably enqueue a job.
    async fn enqueue(&self, job: &GenerationJob) -> Result<JobHandle, MqError>;

    /// Wait for the next job. Dropping the future abandons the wait.
    async fn dequeue(&self) -> Result<Delivery, MqError>;

    /// The delivery was handled; remove it.
    async fn ack(&self, delivery: Delivery) -> Result<(), MqError>;

    /// The delivery failed; hand it to the queue's redelivery policy.
    async fn nack(&self, delivery: Delivery) -> Result<(), MqError>;
}
