//! # Synchronizer
//!
//! Copies one transferred file to every target of its job.
//!
//! ## Workflow
//!
//! 1. Resolve the destination of every target from its template. A template
//!    or time format error fails the transfer before anything is copied.
//! 2. Copy the source object to each destination in declared order. Copies
//!    overwrite existing objects.
//! 3. If the job sets `delete`, delete the source once all copies succeeded.
//!
//! What happens when a copy fails depends on [`TargetFailurePolicy`]:
//! `Abort` stops at the first failure, `Continue` attempts every target and
//! reports all failures together. Either way the source is kept when any
//! target failed. Copies already made are not rolled back; redelivery of the
//! transfer repeats them.

use crate::error::{Result, SyncError, TargetFailure};
use crate::job::Transfer;
use crate::template;
use bridge_traits::storage::{RemoteAddress, RemoteStore};
use core_runtime::config::TargetFailurePolicy;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Summary of one completed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub source: RemoteAddress,
    /// Destinations written, in declared order
    pub copied: Vec<RemoteAddress>,
    pub source_deleted: bool,
}

pub struct Synchronizer {
    store: Arc<dyn RemoteStore>,
    policy: TargetFailurePolicy,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            policy: TargetFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TargetFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TargetFailurePolicy {
        self.policy
    }

    /// Destination of every target of `transfer`, in declared order
    pub fn resolve_targets(&self, transfer: &Transfer) -> Result<Vec<RemoteAddress>> {
        transfer
            .job
            .targets
            .iter()
            .map(|target| {
                let path = template::target_path(&transfer.file, target)?;
                Ok(RemoteAddress::new(target.remote.clone(), path))
            })
            .collect()
    }

    /// Copy the file of `transfer` to all targets, then delete the source if
    /// the job asks for it
    #[instrument(skip(self, transfer), fields(job = %transfer.job.name, file = %transfer.file.name))]
    pub async fn sync(&self, transfer: &Transfer) -> Result<SyncReport> {
        if transfer.job.targets.is_empty() {
            return Err(SyncError::InvalidJob(format!(
                "job '{}' has no targets",
                transfer.job.name
            )));
        }

        let source = transfer.source_address();
        let destinations = self.resolve_targets(transfer)?;

        let mut copied = Vec::with_capacity(destinations.len());
        let mut failures = Vec::new();

        for (index, destination) in destinations.iter().enumerate() {
            match self.store.copy(&source, destination).await {
                Ok(()) => {
                    debug!(from = %source, to = %destination, "Copied");
                    copied.push(destination.clone());
                }
                Err(e) => {
                    error!(from = %source, to = %destination, error = %e, "Copy failed");
                    match self.policy {
                        TargetFailurePolicy::Abort => return Err(e.into()),
                        TargetFailurePolicy::Continue => failures.push(TargetFailure {
                            index,
                            destination: destination.to_string(),
                            message: e.to_string(),
                        }),
                    }
                }
            }
        }

        if !failures.is_empty() {
            if transfer.job.source.delete {
                warn!(source = %source, "Keeping source because a target failed");
            }
            return Err(SyncError::TargetsFailed {
                attempted: destinations.len(),
                failures,
            });
        }

        let source_deleted = if transfer.job.source.delete {
            self.store.delete(&source).await?;
            true
        } else {
            false
        };

        info!(
            targets = copied.len(),
            source_deleted, "Synchronized file"
        );

        Ok(SyncReport {
            source,
            copied,
            source_deleted,
        })
    }
}
