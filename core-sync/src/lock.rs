//! # Job Locks
//!
//! Per-job mutual exclusion kept in the remote store itself.
//!
//! ## Overview
//!
//! Each job has a record at `<dataRoot>/mutex/<job>` holding the text `true`
//! or `false`. A missing or empty record counts as `false`.
//!
//! [`RemoteLockStore`] supports two modes:
//!
//! - [`LockMode::Advisory`]: read the record and write `true` if it was not
//!   set. Two compilers that both read `false` before either writes will both
//!   proceed; the later watermark write wins. This is the behaviour of backends
//!   without conditional writes.
//! - [`LockMode::Conditional`]: replace the observed value with `true` using
//!   the store's compare-and-swap, so only one contender succeeds. A store that
//!   cannot do conditional writes makes acquisition fail with
//!   [`SyncError::LockUnavailable`] instead of falling back.
//!
//! Locks have no lease. A compiler that dies between acquire and release
//! leaves the record at `true` until an operator resets it.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::{
    error::BridgeError,
    storage::{RemoteAddress, RemoteStore},
};
use bytes::Bytes;
use core_runtime::config::LockMode;
use std::sync::Arc;
use tracing::{debug, instrument};

const LOCK_DIR: &str = "mutex";
const HELD: &[u8] = b"true";
const FREE: &[u8] = b"false";

/// Mutual exclusion keyed by job name
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Take the lock for `key`. Returns `false` if it is already held.
    async fn try_acquire(&self, key: &str) -> Result<bool>;

    /// Release the lock for `key`
    async fn release(&self, key: &str) -> Result<()>;
}

/// Lock records stored under `<dataRoot>/mutex`
pub struct RemoteLockStore {
    store: Arc<dyn RemoteStore>,
    root: RemoteAddress,
    mode: LockMode,
}

impl RemoteLockStore {
    /// Create a lock store for the data root `data_root`
    pub fn new(store: Arc<dyn RemoteStore>, data_root: &RemoteAddress, mode: LockMode) -> Self {
        Self {
            store,
            root: data_root.join(LOCK_DIR),
            mode,
        }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Address of the record for `key`
    pub fn record_address(&self, key: &str) -> RemoteAddress {
        self.root.join(key)
    }

    /// Current state of the lock for `key`
    pub async fn is_held(&self, key: &str) -> Result<bool> {
        let address = self.record_address(key);
        let current = self.store.read(&address).await?;
        parse_flag(&address, current.as_deref())
    }

    async fn acquire_advisory(&self, address: &RemoteAddress) -> Result<bool> {
        let current = self.store.read(address).await?;
        if parse_flag(address, current.as_deref())? {
            return Ok(false);
        }
        self.store.write(address, Bytes::from_static(HELD)).await?;
        Ok(true)
    }

    async fn acquire_conditional(&self, address: &RemoteAddress) -> Result<bool> {
        let current = self.store.read(address).await?;
        if parse_flag(address, current.as_deref())? {
            return Ok(false);
        }

        match self
            .store
            .compare_and_swap(address, current.as_deref(), Bytes::from_static(HELD))
            .await
        {
            Ok(swapped) => Ok(swapped),
            Err(BridgeError::NotAvailable(reason)) => Err(SyncError::LockUnavailable(format!(
                "conditional lock on {} needs compare-and-swap: {}",
                address, reason
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LockStore for RemoteLockStore {
    #[instrument(skip(self), fields(mode = %self.mode))]
    async fn try_acquire(&self, key: &str) -> Result<bool> {
        let address = self.record_address(key);
        let acquired = match self.mode {
            LockMode::Advisory => self.acquire_advisory(&address).await?,
            LockMode::Conditional => self.acquire_conditional(&address).await?,
        };
        debug!(record = %address, acquired, "Lock acquisition attempted");
        Ok(acquired)
    }

    #[instrument(skip(self))]
    async fn release(&self, key: &str) -> Result<()> {
        let address = self.record_address(key);
        self.store.write(&address, Bytes::from_static(FREE)).await?;
        debug!(record = %address, "Lock released");
        Ok(())
    }
}

/// Parse a lock record. Missing and empty records are `false`.
fn parse_flag(address: &RemoteAddress, raw: Option<&[u8]>) -> Result<bool> {
    let text = match raw {
        None => return Ok(false),
        Some(bytes) => String::from_utf8_lossy(bytes),
    };

    match text.trim() {
        "" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(SyncError::CorruptRecord {
            address: address.to_string(),
            value: other.to_string(),
        }),
    }
}
