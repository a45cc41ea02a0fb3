//! Core service façade and bootstrap helpers.
//!
//! This crate wires the remote store and the two task queues into the transfer
//! core and exposes one entry point per stage: `schedule` puts every job on the
//! job queue, `compile` drains the job queue, `synchronize` drains the
//! transfer queue. Single-host deployments enable the `local-bridges` feature
//! (which depends on `bridge-local`) and call [`bootstrap`].

pub mod error;
pub mod handlers;
pub mod worker;

#[cfg(feature = "local-bridges")]
mod bootstrap;

pub use error::{CoreError, Result};
pub use handlers::{CompileHandler, HandlerOutcome, MessageHandler, SyncHandler};
pub use worker::{DrainReport, QueueWorker, WorkerConfig};

#[cfg(feature = "local-bridges")]
pub use bootstrap::{bootstrap, config_provider};

use std::sync::Arc;

use bridge_traits::{queue::TaskQueue, storage::RemoteStore};
use core_runtime::config::RuntimeConfig;
use core_sync::{
    JobCompiler, JobRegistry, QueueEnqueuer, RemoteLockStore, RemoteWatermarkStore,
    ScheduleReport, Synchronizer,
};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub store: Arc<dyn RemoteStore>,
    pub job_queue: Arc<dyn TaskQueue>,
    pub transfer_queue: Arc<dyn TaskQueue>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        job_queue: Arc<dyn TaskQueue>,
        transfer_queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            store,
            job_queue,
            transfer_queue,
        }
    }
}

/// Primary façade exposed to the binary and to embedding hosts.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<RuntimeConfig>,
    deps: Arc<CoreDependencies>,
    worker: WorkerConfig,
}

impl CoreService {
    /// Create a new service from the provided configuration and dependencies.
    pub fn new(config: RuntimeConfig, deps: CoreDependencies) -> Self {
        let worker = WorkerConfig {
            batch_size: config.batch_size,
            concurrency: config.worker_concurrency,
            ..WorkerConfig::default()
        };
        Self {
            config: Arc::new(config),
            deps: Arc::new(deps),
            worker,
        }
    }

    /// Replace the tuning used by the compile and synchronize workers
    pub fn with_worker_config(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }

    pub fn worker_config(&self) -> &WorkerConfig {
        &self.worker
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    fn enqueuer(&self) -> Arc<QueueEnqueuer> {
        Arc::new(QueueEnqueuer::new(
            self.deps.job_queue.clone(),
            self.deps.transfer_queue.clone(),
        ))
    }

    pub fn registry(&self) -> JobRegistry {
        JobRegistry::new(self.deps.store.clone(), self.enqueuer())
    }

    /// Compiler over the configured data root
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CapabilityMissing` when no data remote is configured.
    pub fn compiler(&self) -> Result<JobCompiler> {
        let data = self.config.data_address()?;
        let store = self.deps.store.clone();
        Ok(JobCompiler::new(
            store.clone(),
            Arc::new(RemoteLockStore::new(
                store.clone(),
                &data,
                self.config.lock_mode,
            )),
            Arc::new(RemoteWatermarkStore::new(store, &data)),
            self.enqueuer(),
        ))
    }

    pub fn synchronizer(&self) -> Synchronizer {
        Synchronizer::new(self.deps.store.clone()).with_policy(self.config.target_failure_policy)
    }

    /// Load the job list and put every job on the job queue
    pub async fn schedule(&self) -> Result<ScheduleReport> {
        let address = self.config.job_config_address()?;
        Ok(self.registry().run(&address).await?)
    }

    /// Worker draining the job queue into the compiler
    pub fn compile_worker(&self) -> Result<QueueWorker> {
        let handler = CompileHandler::new(Arc::new(self.compiler()?));
        Ok(QueueWorker::new(
            self.deps.job_queue.clone(),
            Arc::new(handler),
            self.worker.clone(),
        ))
    }

    /// Worker draining the transfer queue into the synchronizer
    pub fn synchronize_worker(&self) -> QueueWorker {
        let handler = SyncHandler::new(Arc::new(self.synchronizer()));
        QueueWorker::new(
            self.deps.transfer_queue.clone(),
            Arc::new(handler),
            self.worker.clone(),
        )
    }
}
