//! # Incremental Transfer Core
//!
//! Schedules, compiles and synchronizes file transfers between remote stores.
//!
//! ## Overview
//!
//! Work moves through three stages, each fed by a queue:
//!
//! - **Job Registry** (`registry`): loads the job list and enqueues one job
//!   message per job
//! - **Job Compiler** (`compiler`): takes a job's lock, selects source files
//!   newer than its watermark, enqueues one transfer per file and advances the
//!   watermark
//! - **Synchronizer** (`synchronizer`): copies one file to every target of its
//!   job, optionally deleting the source
//!
//! ## Components
//!
//! - **Entities** (`job`): `Job`, `TransferFile`, `Transfer` and their wire format
//! - **Templates** (`template`): destination path rendering
//! - **Locks** (`lock`): per-job lock records, advisory or conditional
//! - **Watermarks** (`watermark`): per-job modification-time cutoffs
//! - **Enqueuer** (`enqueuer`): hands jobs and transfers to the next stage

pub mod compiler;
pub mod enqueuer;
pub mod error;
pub mod job;
pub mod lock;
pub mod registry;
pub mod synchronizer;
pub mod template;
pub mod watermark;

pub use compiler::{CompileOutcome, CompileReport, JobCompiler};
pub use enqueuer::{Enqueuer, QueueEnqueuer};
pub use error::{Result, SyncError, TargetFailure};
pub use job::{Job, JobSource, JobTarget, Transfer, TransferFile};
pub use lock::{LockStore, RemoteLockStore};
pub use registry::{JobRegistry, ScheduleReport};
pub use synchronizer::{SyncReport, Synchronizer};
pub use template::{target_path, PathTemplate};
pub use watermark::{RemoteWatermarkStore, WatermarkStore, NO_WATERMARK};
