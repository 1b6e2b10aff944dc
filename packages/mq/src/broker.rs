use async_trait::async_trait;
use common::GenerationJob;
use tracing::debug;

use crate::error::MqError;
use crate::models::{BrokerMessage, MqQueue};
use crate::queue::{Delivery, JobHandle, JobQueue, Receipt};

/// Redis-backed [`JobQueue`] over a broccoli queue.
///
/// Redelivery of rejected messages follows the retry strategy the queue was
/// built with (see [`crate::init_mq`]).
pub struct BrokerQueue {
    mq: MqQueue,
    queue_name: String,
}

impl BrokerQueue {
    pub fn new(mq: MqQueue, queue_name: impl Into<String>) -> Self {
        Self {
            mq,
            queue_name: queue_name.into(),
        }
    }
}

fn into_delivery(message: BrokerMessage<GenerationJob>) -> Delivery {
    Delivery {
        job: message.payload.clone(),
        handle: JobHandle(message.task_id.to_string()),
        attempt: u32::from(message.attempts) + 1,
        receipt: Receipt::Broker(Box::new(message)),
    }
}

fn broker_message(delivery: Delivery) -> Result<BrokerMessage<GenerationJob>, MqError> {
    match delivery.receipt {
        Receipt::Broker(message) => Ok(*message),
        Receipt::Memory => Err(MqError::Broker(format!(
            "delivery {} does not belong to a broker queue",
            delivery.handle
        ))),
    }
}

#[async_trait]
impl JobQueue for BrokerQueue {
    async fn enqueue(&self, job: &GenerationJob) -> Result<JobHandle, MqError> {
        let published = self.mq.publish(&self.queue_name, None, job, None).await?;
        debug!(
            queue = %self.queue_name,
            task_id = %published.task_id,
            generation_id = %job.generation_id,
            "Published generation job"
        );
        Ok(JobHandle(published.task_id.to_string()))
    }

    async fn dequeue(&self) -> Result<Delivery, MqError> {
        let message = self
            .mq
            .consume::<GenerationJob>(&self.queue_name, None)
            .await?;
        Ok(into_delivery(message))
    }

    async fn ack(&self, delivery: Delivery) -> Result<(), MqError> {
        let message = broker_message(delivery)?;
        self.mq.acknowledge(&self.queue_name, message).await?;
        Ok(())
    }

    async fn nack(&self, delivery: Delivery) -> Result<(), MqError> {
        let message = broker_message(delivery)?;
        self.mq.reject(&self.queue_name, message).await?;
        Ok(())
    }
}
