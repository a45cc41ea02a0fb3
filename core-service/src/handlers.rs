//! Per-stage message handlers
//!
//! Each handler decodes one queue message body and runs the matching core
//! operation. Job bodies go to the compiler, transfer bodies to the
//! synchronizer. A locked job is reported as [`HandlerOutcome::Skipped`],
//! which the worker treats as success.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use core_sync::{
    CompileOutcome, CompileReport, Job, JobCompiler, SyncReport, Synchronizer, Transfer,
};
use std::sync::Arc;
use tracing::debug;

/// What a handler did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Compiled(CompileReport),
    Synchronized(SyncReport),
    /// The job was locked by another compilation
    Skipped { job: String },
}

/// Processes the body of one queue message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Name used in logs
    fn stage(&self) -> &'static str;

    async fn handle(&self, body: &str) -> Result<HandlerOutcome>;
}

/// Decode a job message
pub fn decode_job(body: &str) -> Result<Job> {
    let mut job: Job = serde_json::from_str(body).map_err(|e| CoreError::Decode {
        queue: "job".to_string(),
        reason: e.to_string(),
    })?;
    job.clean();
    Ok(job)
}

/// Decode a transfer message
pub fn decode_transfer(body: &str) -> Result<Transfer> {
    let mut transfer: Transfer = serde_json::from_str(body).map_err(|e| CoreError::Decode {
        queue: "transfer".to_string(),
        reason: e.to_string(),
    })?;
    transfer.job.clean();
    Ok(transfer)
}

/// Compiles jobs received from the job queue
pub struct CompileHandler {
    compiler: Arc<JobCompiler>,
}

impl CompileHandler {
    pub fn new(compiler: Arc<JobCompiler>) -> Self {
        Self { compiler }
    }
}

#[async_trait]
impl MessageHandler for CompileHandler {
    fn stage(&self) -> &'static str {
        "compile"
    }

    async fn handle(&self, body: &str) -> Result<HandlerOutcome> {
        let job = decode_job(body)?;
        debug!(job = %job, "Compiling job");

        match self.compiler.compile_job(&job).await? {
            CompileOutcome::Locked => Ok(HandlerOutcome::Skipped { job: job.name }),
            CompileOutcome::Completed(report) => Ok(HandlerOutcome::Compiled(report)),
        }
    }
}

/// Synchronizes transfers received from the transfer queue
pub struct SyncHandler {
    synchronizer: Arc<Synchronizer>,
}

impl SyncHandler {
    pub fn new(synchronizer: Arc<Synchronizer>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl MessageHandler for SyncHandler {
    fn stage(&self) -> &'static str {
        "synchronize"
    }

    async fn handle(&self, body: &str) -> Result<HandlerOutcome> {
        let transfer = decode_transfer(body)?;
        debug!(transfer = %transfer, "Synchronizing transfer");

        let report = self.synchronizer.sync(&transfer).await?;
        Ok(HandlerOutcome::Synchronized(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_local::{MemoryQueue, MemoryStore};
    use bridge_traits::storage::RemoteAddress;
    use core_runtime::config::LockMode;
    use core_sync::{QueueEnqueuer, RemoteLockStore, RemoteWatermarkStore};

    const JOB: &str = r#"{"name":"nightly",
        "source":{"remote":"in/box","root":"incoming","pattern":"","delete":false},
        "targets":[{"remote":"archive","root":"out","pattern":"{{.Name}}.{{.Extension}}",
                    "dateFormat":"","timeFormat":""}]}"#;

    fn compile_handler(store: Arc<MemoryStore>) -> CompileHandler {
        let data = RemoteAddress::new("state", "data");
        let compiler = JobCompiler::new(
            store.clone(),
            Arc::new(RemoteLockStore::new(store.clone(), &data, LockMode::Advisory)),
            Arc::new(RemoteWatermarkStore::new(store.clone(), &data)),
            Arc::new(QueueEnqueuer::new(
                Arc::new(MemoryQueue::new("jobs")),
                Arc::new(MemoryQueue::new("transfers")),
            )),
        );
        CompileHandler::new(Arc::new(compiler))
    }

    #[test]
    fn test_decode_job_cleans_remotes() {
        let job = decode_job(JOB).unwrap();
        assert_eq!(job.source.remote, "inbox");
    }

    #[test]
    fn test_decode_errors_are_not_retryable() {
        let err = decode_transfer("{\"file\": 3}").unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_compile_handler_reports_lock_as_skip() {
        let store = Arc::new(MemoryStore::new());
        store.put_object(&RemoteAddress::new("inbox", "incoming/a.txt"), "a", 10);
        store.put_object(&RemoteAddress::new("state", "data/mutex/nightly"), "true", 0);
        let handler = compile_handler(store.clone());

        assert_eq!(
            handler.handle(JOB).await.unwrap(),
            HandlerOutcome::Skipped {
                job: "nightly".to_string()
            }
        );

        store.put_object(&RemoteAddress::new("state", "data/mutex/nightly"), "false", 0);
        match handler.handle(JOB).await.unwrap() {
            HandlerOutcome::Compiled(report) => assert_eq!(report.enqueued, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sync_handler_copies() {
        let store = Arc::new(MemoryStore::new());
        store.put_object(&RemoteAddress::new("inbox", "incoming/a.txt"), "a", 10);
        let handler = SyncHandler::new(Arc::new(Synchronizer::new(store.clone())));

        let body = format!(
            r#"{{"file":{{"name":"a.txt","size":1,"lastModified":10}},"job":{}}}"#,
            JOB
        );
        match handler.handle(&body).await.unwrap() {
            HandlerOutcome::Synchronized(report) => {
                assert_eq!(report.copied, vec![RemoteAddress::new("archive", "out/a.txt")]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(store.contains(&RemoteAddress::new("archive", "out/a.txt")));
    }
}
