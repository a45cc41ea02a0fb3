//! # Job Compiler
//!
//! Turns one job into one transfer per new source file.
//!
//! ## Workflow
//!
//! 1. Validate the job and compile its source pattern (nothing is touched if
//!    either fails)
//! 2. Take the job lock; if it is held, stop with [`CompileOutcome::Locked`]
//! 3. Read the watermark (`-1` when unset)
//! 4. List everything under the source root and keep files whose path matches
//!    the pattern and whose modification time is strictly newer than the
//!    watermark
//! 5. Enqueue a transfer per match; a failed enqueue is logged and skipped and
//!    does not count toward the new watermark
//! 6. Write the watermark: the newest enqueued modification time, never less
//!    than the previous value
//! 7. Release the lock
//!
//! A failure in steps 3, 4 or 6 returns before step 7 and leaves the lock
//! held.
//!
//! ## Usage
//!
//! ```ignore
//! let compiler = JobCompiler::new(store, locks, watermarks, enqueuer);
//! match compiler.compile_job(&job).await? {
//!     CompileOutcome::Locked => {}
//!     CompileOutcome::Completed(report) => println!("{} transfers", report.enqueued),
//! }
//! ```

use crate::enqueuer::Enqueuer;
use crate::error::Result;
use crate::job::{Job, Transfer, TransferFile};
use crate::lock::LockStore;
use crate::watermark::WatermarkStore;
use bridge_traits::storage::RemoteStore;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Summary of one completed compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub job: String,
    pub previous_watermark: i64,
    pub watermark: i64,
    /// Files that passed the pattern and watermark filters
    pub matched: usize,
    /// Transfers successfully enqueued
    pub enqueued: usize,
    /// Files whose transfer could not be enqueued
    pub failed: Vec<String>,
}

/// Result of asking to compile a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Another compilation holds the job lock; nothing was done
    Locked,
    Completed(CompileReport),
}

pub struct JobCompiler {
    store: Arc<dyn RemoteStore>,
    locks: Arc<dyn LockStore>,
    watermarks: Arc<dyn WatermarkStore>,
    enqueuer: Arc<dyn Enqueuer>,
}

impl JobCompiler {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        locks: Arc<dyn LockStore>,
        watermarks: Arc<dyn WatermarkStore>,
        enqueuer: Arc<dyn Enqueuer>,
    ) -> Self {
        Self {
            store,
            locks,
            watermarks,
            enqueuer,
        }
    }

    /// Source files of `job` that match its pattern and are newer than `since`
    ///
    /// Order follows the store's listing.
    pub async fn compile(&self, job: &Job, since: i64) -> Result<Vec<TransferFile>> {
        let pattern = job.source.compile_pattern()?;
        self.matching_files(job, &pattern, since).await
    }

    async fn matching_files(
        &self,
        job: &Job,
        pattern: &Regex,
        since: i64,
    ) -> Result<Vec<TransferFile>> {
        let objects = self.store.list(&job.source.root_address()).await?;
        Ok(objects
            .into_iter()
            .filter(|object| pattern.is_match(&object.path) && object.modified_at > since)
            .map(TransferFile::from)
            .collect())
    }

    /// Run the full locked compilation of `job`
    #[instrument(skip(self, job), fields(job = %job.name))]
    pub async fn compile_job(&self, job: &Job) -> Result<CompileOutcome> {
        job.validate()?;
        let pattern = job.source.compile_pattern()?;

        if !self.locks.try_acquire(&job.name).await? {
            info!("Job is locked, skipping");
            return Ok(CompileOutcome::Locked);
        }

        let previous = self.watermarks.get(&job.name).await?;
        let files = self.matching_files(job, &pattern, previous).await?;

        let mut watermark = previous;
        let mut enqueued = 0;
        let mut failed = Vec::new();

        for file in &files {
            let transfer = Transfer::new(file.clone(), job.clone());
            match self.enqueuer.enqueue_transfer(&transfer).await {
                Ok(()) => {
                    enqueued += 1;
                    watermark = watermark.max(file.last_modified);
                }
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Failed to enqueue transfer");
                    failed.push(file.name.clone());
                }
            }
        }

        self.watermarks.put(&job.name, watermark).await?;
        self.locks.release(&job.name).await?;

        info!(
            matched = files.len(),
            enqueued,
            failed = failed.len(),
            previous_watermark = previous,
            watermark,
            "Compiled job"
        );

        Ok(CompileOutcome::Completed(CompileReport {
            job: job.name.clone(),
            previous_watermark: previous,
            watermark,
            matched: files.len(),
            enqueued,
            failed,
        }))
    }
}
