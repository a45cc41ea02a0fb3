//! Integration tests for incremental transfer
//!
//! These tests drive the registry, compiler and synchronizer against the
//! in-memory store and queues:
//! - Watermark advance across consecutive compilations
//! - Lock handling for overlapping compilations
//! - End-to-end schedule → compile → synchronize with templated destinations
//! - Partial enqueue failures

use bridge_local::{MemoryQueue, MemoryStore, StoreOp};
use bridge_traits::{
    queue::TaskQueue,
    storage::{RemoteAddress, RemoteStore},
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use core_runtime::config::{LockMode, TargetFailurePolicy};
use core_sync::{
    CompileOutcome, CompileReport, Job, JobCompiler, JobRegistry, JobSource, JobTarget,
    QueueEnqueuer, RemoteLockStore, RemoteWatermarkStore, SyncError, Synchronizer, Transfer,
    WatermarkStore,
};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

struct Harness {
    store: Arc<MemoryStore>,
    jobs: Arc<MemoryQueue>,
    transfers: Arc<MemoryQueue>,
    watermarks: Arc<RemoteWatermarkStore>,
    compiler: JobCompiler,
}

fn data_root() -> RemoteAddress {
    RemoteAddress::new("state", "bucket/transferless")
}

fn harness(mode: LockMode) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let jobs = Arc::new(MemoryQueue::new("jobs"));
    let transfers = Arc::new(MemoryQueue::new("transfers"));
    let locks = Arc::new(RemoteLockStore::new(store.clone(), &data_root(), mode));
    let watermarks = Arc::new(RemoteWatermarkStore::new(store.clone(), &data_root()));
    let enqueuer = Arc::new(QueueEnqueuer::new(jobs.clone(), transfers.clone()));
    let compiler = JobCompiler::new(store.clone(), locks, watermarks.clone(), enqueuer);

    Harness {
        store,
        jobs,
        transfers,
        watermarks,
        compiler,
    }
}

fn report_job(delete: bool) -> Job {
    Job {
        name: "reports".to_string(),
        source: JobSource {
            remote: "inbox".to_string(),
            root: "incoming".to_string(),
            pattern: r"\.csv$".to_string(),
            delete,
        },
        targets: vec![
            JobTarget {
                remote: "archive".to_string(),
                root: "out".to_string(),
                pattern: "{{.Name}}-{{.Date}}.{{.Extension}}".to_string(),
                date_format: "2006-01-02".to_string(),
                time_format: String::new(),
            },
            JobTarget {
                remote: "mirror".to_string(),
                root: "by-day".to_string(),
                pattern: "{{.Date}}/{{.Dir}}/{{.Time}}_{{.Name}}.{{.Extension}}".to_string(),
                date_format: "20060102".to_string(),
                time_format: "150405".to_string(),
            },
        ],
    }
}

fn source(path: &str) -> RemoteAddress {
    RemoteAddress::new("inbox", "incoming").join(path)
}

fn march_fifth() -> i64 {
    Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 7).unwrap().timestamp()
}

async fn completed(harness: &Harness, job: &Job) -> CompileReport {
    match harness.compiler.compile_job(job).await.unwrap() {
        CompileOutcome::Completed(report) => report,
        CompileOutcome::Locked => panic!("job unexpectedly locked"),
    }
}

fn lock_record(harness: &Harness) -> Option<Bytes> {
    harness
        .store
        .get_object(&data_root().join("mutex").join("reports"))
}

// ============================================================================
// Compilation
// ============================================================================

#[tokio::test]
async fn test_consecutive_compilations_only_pick_new_files() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("a.csv"), "a", 100);
    h.store.put_object(&source("b.csv"), "b", 200);
    h.store.put_object(&source("notes.txt"), "n", 500);

    let first = completed(&h, &report_job(false)).await;
    assert_eq!(first.previous_watermark, -1);
    assert_eq!(first.enqueued, 2);
    assert_eq!(first.watermark, 200);
    assert_eq!(h.watermarks.get("reports").await.unwrap(), 200);

    // Same second as the watermark: never selected again
    h.store.put_object(&source("c.csv"), "c", 200);
    h.store.put_object(&source("d.csv"), "d", 201);

    let second = completed(&h, &report_job(false)).await;
    assert_eq!(second.matched, 1);
    assert_eq!(second.watermark, 201);

    let bodies = h.transfers.pending_bodies();
    assert_eq!(bodies.len(), 3);
    let last: Transfer = serde_json::from_str(&bodies[2]).unwrap();
    assert_eq!(last.file.name, "d.csv");
    assert_eq!(last.job, report_job(false));

    assert_eq!(lock_record(&h), Some(Bytes::from_static(b"false")));
}

#[tokio::test]
async fn test_locked_job_produces_nothing() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("a.csv"), "a", 100);
    h.store.put_object(
        &data_root().join("mutex/reports"),
        Bytes::from_static(b"true"),
        0,
    );
    h.store.put_object(
        &data_root().join("modtime/reports"),
        Bytes::from_static(b"50"),
        0,
    );

    let outcome = h.compiler.compile_job(&report_job(false)).await.unwrap();

    assert_eq!(outcome, CompileOutcome::Locked);
    assert_eq!(h.transfers.visible_len(), 0);
    assert_eq!(h.watermarks.get("reports").await.unwrap(), 50);
    assert!(h.store.calls(StoreOp::List).is_empty());
}

#[tokio::test]
async fn test_zero_matches_still_releases_lock() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("notes.txt"), "n", 100);

    let report = completed(&h, &report_job(false)).await;

    assert_eq!(report.matched, 0);
    assert_eq!(report.watermark, -1);
    assert_eq!(lock_record(&h), Some(Bytes::from_static(b"false")));
}

#[tokio::test]
async fn test_failed_enqueue_is_skipped() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("only.csv"), "x", 300);
    h.transfers.reject_next_sends(1);

    let report = completed(&h, &report_job(false)).await;

    assert_eq!(report.enqueued, 0);
    assert_eq!(report.failed, vec!["only.csv"]);
    assert_eq!(report.watermark, -1);
    assert_eq!(lock_record(&h), Some(Bytes::from_static(b"false")));

    // The file is picked up again on the next run
    let retry = completed(&h, &report_job(false)).await;
    assert_eq!(retry.enqueued, 1);
    assert_eq!(retry.watermark, 300);
}

#[tokio::test]
async fn test_watermark_write_failure_leaves_lock_held() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("a.csv"), "a", 100);
    h.store
        .fail_on(StoreOp::Write, &data_root().join("modtime/reports"));

    let result = h.compiler.compile_job(&report_job(false)).await;

    assert!(matches!(result, Err(SyncError::Storage(_))));
    assert_eq!(lock_record(&h), Some(Bytes::from_static(b"true")));
}

#[tokio::test]
async fn test_conditional_lock_mode() {
    let h = harness(LockMode::Conditional);
    h.store.put_object(&source("a.csv"), "a", 100);

    let report = completed(&h, &report_job(false)).await;
    assert_eq!(report.enqueued, 1);
    assert_eq!(h.store.calls(StoreOp::CompareAndSwap).len(), 1);
    assert_eq!(lock_record(&h), Some(Bytes::from_static(b"false")));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_schedule_compile_synchronize() {
    let h = harness(LockMode::Advisory);
    let job_list = RemoteAddress::new("config", "jobs.json");
    h.store.put_object(
        &job_list,
        serde_json::to_vec(&vec![report_job(true)]).unwrap(),
        0,
    );
    h.store
        .put_object(&source("reports/q1.csv"), "id,total\n1,10\n", march_fifth());

    // Schedule
    let registry = JobRegistry::new(
        h.store.clone(),
        Arc::new(QueueEnqueuer::new(h.jobs.clone(), h.transfers.clone())),
    );
    let scheduled = registry.run(&job_list).await.unwrap();
    assert_eq!(scheduled.scheduled, vec!["reports"]);

    // Compile
    let job_messages = h.jobs.receive(10).await.unwrap();
    assert_eq!(job_messages.len(), 1);
    let job: Job = serde_json::from_str(&job_messages[0].body).unwrap();
    let report = completed(&h, &job).await;
    assert_eq!(report.enqueued, 1);
    h.jobs.acknowledge(&job_messages[0].receipt).await.unwrap();

    // Synchronize
    let transfer_messages = h.transfers.receive(10).await.unwrap();
    let transfer: Transfer = serde_json::from_str(&transfer_messages[0].body).unwrap();
    let synchronizer = Synchronizer::new(h.store.clone());
    let sync = synchronizer.sync(&transfer).await.unwrap();

    assert_eq!(
        sync.copied,
        vec![
            RemoteAddress::new("archive", "out/q1-2024-03-05.csv"),
            RemoteAddress::new("mirror", "by-day/20240305/reports/093007_q1.csv"),
        ]
    );
    assert!(sync.source_deleted);
    assert!(!h.store.contains(&source("reports/q1.csv")));
    assert_eq!(
        h.store
            .read(&RemoteAddress::new("archive", "out/q1-2024-03-05.csv"))
            .await
            .unwrap(),
        Some(Bytes::from_static(b"id,total\n1,10\n"))
    );
}

#[tokio::test]
async fn test_partial_fan_out_keeps_source() {
    let h = harness(LockMode::Advisory);
    h.store.put_object(&source("q1.csv"), "data", march_fifth());
    h.store.fail_on(
        StoreOp::Copy,
        &RemoteAddress::new("archive", "out/q1-2024-03-05.csv"),
    );

    let transfer = Transfer::new(
        core_sync::TransferFile {
            name: "q1.csv".to_string(),
            size: 4,
            last_modified: march_fifth(),
        },
        report_job(true),
    );

    let synchronizer =
        Synchronizer::new(h.store.clone()).with_policy(TargetFailurePolicy::Continue);
    let result = synchronizer.sync(&transfer).await;

    assert!(matches!(result, Err(SyncError::TargetsFailed { .. })));
    assert!(h.store.contains(&source("q1.csv")));
    assert!(h
        .store
        .contains(&RemoteAddress::new("mirror", "by-day/20240305/093007_q1.csv")));
    assert!(h.store.calls(StoreOp::Delete).is_empty());
}
