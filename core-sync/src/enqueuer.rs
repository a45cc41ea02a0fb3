//! Hands jobs and transfers to the next stage

use crate::error::Result;
use crate::job::{Job, Transfer};
use async_trait::async_trait;
use bridge_traits::queue::TaskQueue;
use std::sync::Arc;
use tracing::debug;

/// Emits work for the downstream stages
#[async_trait]
pub trait Enqueuer: Send + Sync {
    /// Queue a job for compilation
    async fn enqueue_job(&self, job: &Job) -> Result<()>;

    /// Queue one file for synchronization
    async fn enqueue_transfer(&self, transfer: &Transfer) -> Result<()>;
}

/// Sends JSON-encoded messages to a job queue and a transfer queue
pub struct QueueEnqueuer {
    jobs: Arc<dyn TaskQueue>,
    transfers: Arc<dyn TaskQueue>,
}

impl QueueEnqueuer {
    pub fn new(jobs: Arc<dyn TaskQueue>, transfers: Arc<dyn TaskQueue>) -> Self {
        Self { jobs, transfers }
    }
}

#[async_trait]
impl Enqueuer for QueueEnqueuer {
    async fn enqueue_job(&self, job: &Job) -> Result<()> {
        let body = serde_json::to_string(job)?;
        self.jobs.send(body).await?;
        debug!(queue = self.jobs.name(), job = %job.name, "Enqueued job");
        Ok(())
    }

    async fn enqueue_transfer(&self, transfer: &Transfer) -> Result<()> {
        let body = serde_json::to_string(transfer)?;
        self.transfers.send(body).await?;
        debug!(
            queue = self.transfers.name(),
            job = %transfer.job.name,
            file = %transfer.file.name,
            "Enqueued transfer"
        );
        Ok(())
    }
}
