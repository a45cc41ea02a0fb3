//! # Transfer Entities
//!
//! The data handed between the scheduler, the compiler and the synchronizer.
//!
//! ## Overview
//!
//! - [`Job`]: a named policy with one source and one or more targets
//! - [`TransferFile`]: a source object discovered by the compiler
//! - [`Transfer`]: one file paired with the full job that owns it
//!
//! All three travel as JSON queue messages. Field names are camelCase
//! (`dateFormat`, `lastModified`); PascalCase names written by earlier
//! producers are accepted on input. `Display` renders the same single-line
//! JSON, which is what log lines show.

use crate::error::{Result, SyncError};
use bridge_traits::{
    path,
    storage::{ObjectInfo, RemoteAddress},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a job reads files from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSource {
    /// Backend identifier
    #[serde(alias = "Remote")]
    pub remote: String,
    /// Directory scanned recursively
    #[serde(alias = "Root", default)]
    pub root: String,
    /// Regular expression searched for in each file path (unanchored)
    #[serde(alias = "Pattern", default)]
    pub pattern: String,
    /// Delete the source once every target has been copied
    #[serde(alias = "Delete", default)]
    pub delete: bool,
}

impl JobSource {
    /// Address of the scanned directory
    pub fn root_address(&self) -> RemoteAddress {
        RemoteAddress::new(self.remote.clone(), &self.root)
    }

    /// Compile the file pattern
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPattern` if the expression does not compile.
    pub fn compile_pattern(&self) -> Result<Regex> {
        Regex::new(&self.pattern).map_err(|e| SyncError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })
    }
}

/// One destination of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTarget {
    #[serde(alias = "Remote")]
    pub remote: String,
    #[serde(alias = "Root", default)]
    pub root: String,
    /// Destination name template over `Dir`, `Name`, `Extension`, `Date`, `Time`
    #[serde(alias = "Pattern", default)]
    pub pattern: String,
    #[serde(alias = "DateFormat", default)]
    pub date_format: String,
    #[serde(alias = "TimeFormat", default)]
    pub time_format: String,
}

/// A named transfer policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique name; keys the lock and watermark records
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Source")]
    pub source: JobSource,
    #[serde(alias = "Targets", default)]
    pub targets: Vec<JobTarget>,
}

impl Job {
    /// Remove `/` from every backend identifier
    pub fn clean(&mut self) {
        self.source.remote = self.source.remote.replace('/', "");
        for target in &mut self.targets {
            target.remote = target.remote.replace('/', "");
        }
    }

    /// Check the job is usable before any state is touched
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidJob` for a missing or unsafe field and
    /// `SyncError::InvalidPattern` if the source pattern does not compile.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SyncError::InvalidJob("job name is empty".to_string()));
        }
        if self.name.contains('/') || self.name == "." || self.name == ".." {
            return Err(SyncError::InvalidJob(format!(
                "job name '{}' cannot be used as a record key",
                self.name
            )));
        }
        if self.source.remote.is_empty() {
            return Err(SyncError::InvalidJob(format!(
                "job '{}' has no source remote",
                self.name
            )));
        }
        if self.targets.is_empty() {
            return Err(SyncError::InvalidJob(format!(
                "job '{}' has no targets",
                self.name
            )));
        }
        if let Some(index) = self.targets.iter().position(|t| t.remote.is_empty()) {
            return Err(SyncError::InvalidJob(format!(
                "job '{}' target #{} has no remote",
                self.name, index
            )));
        }
        self.source.compile_pattern()?;
        Ok(())
    }
}

/// A source object selected for transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFile {
    /// Path relative to the job's source root
    #[serde(alias = "Name")]
    pub name: String,
    /// Size in bytes
    #[serde(alias = "Size", default)]
    pub size: u64,
    /// Modification time (Unix seconds)
    #[serde(alias = "LastModified")]
    pub last_modified: i64,
}

impl From<ObjectInfo> for TransferFile {
    fn from(object: ObjectInfo) -> Self {
        Self {
            name: object.path,
            size: object.size,
            last_modified: object.modified_at,
        }
    }
}

/// One file on its way to every target of its job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(alias = "File")]
    pub file: TransferFile,
    #[serde(alias = "Job")]
    pub job: Job,
}

impl Transfer {
    pub fn new(file: TransferFile, job: Job) -> Self {
        Self { file, job }
    }

    /// Full path of the file on the source backend
    pub fn source_path(&self) -> String {
        path::clean(&path::join([
            self.job.source.root.as_str(),
            self.file.name.as_str(),
        ]))
    }

    pub fn source_address(&self) -> RemoteAddress {
        RemoteAddress::new(self.job.source.remote.clone(), self.source_path())
    }
}

macro_rules! display_as_json {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let encoded = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                    f.write_str(&encoded)
                }
            }
        )+
    };
}

display_as_json!(Job, TransferFile, Transfer);
