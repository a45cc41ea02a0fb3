use bridge_traits::BridgeError;
use std::fmt;
use thiserror::Error;

/// One failed target of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    /// Position of the target in the job's declared order
    pub index: usize,
    /// Resolved destination (`<backend>:<path>`)
    pub destination: String,
    pub message: String,
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target #{} ({}): {}",
            self.index, self.destination, self.message
        )
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid source pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid target template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid time format '{format}': {reason}")]
    InvalidTimeFormat { format: String, reason: String },

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Corrupt record at {address}: {value:?}")]
    CorruptRecord { address: String, value: String },

    #[error("Lock unavailable: {0}")]
    LockUnavailable(String),

    #[error("{} of {attempted} targets failed: {}", .failures.len(), join_failures(.failures))]
    TargetsFailed {
        attempted: usize,
        failures: Vec<TargetFailure>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn join_failures(failures: &[TargetFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyncError {
    /// Configuration errors fail before any state is touched and will fail
    /// the same way on redelivery
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidPattern { .. }
                | SyncError::InvalidTemplate { .. }
                | SyncError::InvalidTimeFormat { .. }
                | SyncError::InvalidJob(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
