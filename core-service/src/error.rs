use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Configuration error: {0}")]
    Runtime(core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Undecodable message on '{queue}': {reason}")]
    Decode { queue: String, reason: String },
}

impl From<core_runtime::Error> for CoreError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            other => CoreError::Runtime(other),
        }
    }
}

impl CoreError {
    /// Whether redelivering the same message can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Decode { .. } => false,
            CoreError::Sync(err) => !err.is_configuration(),
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
