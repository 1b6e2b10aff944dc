use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use common::GenerationJob;
use tokio::sync::Notify;
use tracing::warn;
use uuid::Uuid;

use crate::error::MqError;
use crate::queue::{Delivery, JobHandle, JobQueue, Receipt};

struct Entry {
    job: GenerationJob,
    handle: JobHandle,
    attempt: u32,
}

#[derive(Default)]
struct State {
    ready: VecDeque<Entry>,
    dead: Vec<GenerationJob>,
    closed: bool,
}

/// In-process FIFO [`JobQueue`].
///
/// A nacked delivery goes to the back of the queue until it has been
/// delivered `max_attempts` times, after which it is dropped into a
/// dead-letter list.
pub struct MemoryQueue {
    state: Mutex<State>,
    notify: Notify,
    max_attempts: u32,
}

impl MemoryQueue {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, MqError> {
        self.state
            .lock()
            .map_err(|_| MqError::Broker("memory queue lock poisoned".into()))
    }

    /// Jobs waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.ready.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs that exhausted their attempts.
    pub fn dead_letters(&self) -> Vec<GenerationJob> {
        self.state
            .lock()
            .map(|s| s.dead.clone())
            .unwrap_or_default()
    }

    /// Stop accepting work. Consumers drain what is left, then get
    /// [`MqError::Closed`].
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.notify.notify_waiters();
    }

    fn push(&self, entry: Entry) -> Result<(), MqError> {
        self.lock()?.ready.push_back(entry);
        self.notify.notify_one();
        Ok(())
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: &GenerationJob) -> Result<JobHandle, MqError> {
        if self.lock()?.closed {
            return Err(MqError::Closed);
        }
        let handle = JobHandle(Uuid::now_v7().to_string());
        self.push(Entry {
            job: job.clone(),
            handle: handle.clone(),
            attempt: 1,
        })?;
        Ok(handle)
    }

    async fn dequeue(&self) -> Result<Delivery, MqError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock()?;
                if let Some(entry) = state.ready.pop_front() {
                    return Ok(Delivery {
                        job: entry.job,
                        handle: entry.handle,
                        attempt: entry.attempt,
                        receipt: Receipt::Memory,
                    });
                }
                if state.closed {
                    return Err(MqError::Closed);
                }
            }

            notified.await;
        }
    }

    async fn ack(&self, _delivery: Delivery) -> Result<(), MqError> {
        Ok(())
    }

    async fn nack(&self, delivery: Delivery) -> Result<(), MqError> {
        if delivery.attempt >= self.max_attempts {
            warn!(
                handle = %delivery.handle,
                generation_id = %delivery.job.generation_id,
                attempts = delivery.attempt,
                "Job exhausted its attempts, dropping"
            );
            self.lock()?.dead.push(delivery.job);
            return Ok(());
        }

        self.push(Entry {
            job: delivery.job,
            handle: delivery.handle,
            attempt: delivery.attempt + 1,
        })
    }
}
