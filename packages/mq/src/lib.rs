pub mod broker;
pub mod error;
pub mod memory;
pub mod models;
pub mod queue;

pub use broker::BrokerQueue;
pub use error::MqError;
pub use memory::MemoryQueue;
pub use models::{BrokerMessage, BroccoliError, MqConfig, MqQueue, init_mq};
pub use queue::{Delivery, JobHandle, JobQueue};
