//! # Job Registry
//!
//! Loads the job list and puts every job on the job queue.
//!
//! The job list is a JSON array of job definitions kept as a single object in
//! the remote store. Each job is cleaned (`/` removed from backend
//! identifiers) and validated as it is loaded; a job that fails validation or
//! reuses an earlier job's name is logged and left out so the others still
//! run.

use crate::enqueuer::Enqueuer;
use crate::error::Result;
use crate::job::Job;
use bridge_traits::{
    error::BridgeError,
    storage::{RemoteAddress, RemoteStore},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Summary of one scheduling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Jobs put on the queue
    pub scheduled: Vec<String>,
    /// Jobs that could not be enqueued
    pub failed: Vec<String>,
}

pub struct JobRegistry {
    store: Arc<dyn RemoteStore>,
    enqueuer: Arc<dyn Enqueuer>,
}

impl JobRegistry {
    pub fn new(store: Arc<dyn RemoteStore>, enqueuer: Arc<dyn Enqueuer>) -> Self {
        Self { store, enqueuer }
    }

    /// Read the job list at `address`
    ///
    /// # Errors
    ///
    /// Fails if the object is missing or is not a JSON array of jobs.
    #[instrument(skip(self, address), fields(address = %address))]
    pub async fn load_jobs(&self, address: &RemoteAddress) -> Result<Vec<Job>> {
        let raw = self
            .store
            .read(address)
            .await?
            .ok_or_else(|| BridgeError::NotFound(format!("job list {}", address)))?;

        let definitions: Vec<Job> = serde_json::from_slice(&raw)?;
        let total = definitions.len();

        let mut seen = HashSet::new();
        let mut jobs = Vec::with_capacity(total);
        for mut job in definitions {
            job.clean();
            if let Err(e) = job.validate() {
                warn!(job = %job.name, error = %e, "Skipping invalid job");
                continue;
            }
            if !seen.insert(job.name.clone()) {
                warn!(job = %job.name, "Skipping job with duplicate name");
                continue;
            }
            jobs.push(job);
        }

        info!(total, valid = jobs.len(), "Loaded job list");
        Ok(jobs)
    }

    /// Enqueue one job message per job. Failures are logged and skipped.
    #[instrument(skip(self, jobs), fields(jobs = jobs.len()))]
    pub async fn schedule(&self, jobs: &[Job]) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        for job in jobs {
            match self.enqueuer.enqueue_job(job).await {
                Ok(()) => report.scheduled.push(job.name.clone()),
                Err(e) => {
                    warn!(job = %job.name, error = %e, "Failed to schedule job");
                    report.failed.push(job.name.clone());
                }
            }
        }

        info!(
            scheduled = report.scheduled.len(),
            failed = report.failed.len(),
            "Scheduled jobs"
        );
        report
    }

    /// Load the job list at `address` and schedule every job in it
    pub async fn run(&self, address: &RemoteAddress) -> Result<ScheduleReport> {
        let jobs = self.load_jobs(address).await?;
        Ok(self.schedule(&jobs).await)
    }
}
