//! Per-job watermarks
//!
//! A job's watermark is the modification time of the newest file handed on by
//! its last compilation, stored as a decimal Unix timestamp at
//! `<dataRoot>/modtime/<job>`. Only files strictly newer than the watermark
//! are selected, so a single scalar stands in for per-file tracking. It cannot
//! notice a file whose modification time moved backward, nor a second file
//! carrying the same second as one already sent.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::storage::{RemoteAddress, RemoteStore};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Watermark of a job that has never completed a compilation
pub const NO_WATERMARK: i64 = -1;

const WATERMARK_DIR: &str = "modtime";

#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Watermark for `key`, or [`NO_WATERMARK`]
    async fn get(&self, key: &str) -> Result<i64>;

    async fn put(&self, key: &str, timestamp: i64) -> Result<()>;
}

/// Watermark records stored under `<dataRoot>/modtime`
pub struct RemoteWatermarkStore {
    store: Arc<dyn RemoteStore>,
    root: RemoteAddress,
}

impl RemoteWatermarkStore {
    pub fn new(store: Arc<dyn RemoteStore>, data_root: &RemoteAddress) -> Self {
        Self {
            store,
            root: data_root.join(WATERMARK_DIR),
        }
    }

    pub fn record_address(&self, key: &str) -> RemoteAddress {
        self.root.join(key)
    }
}

#[async_trait]
impl WatermarkStore for RemoteWatermarkStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<i64> {
        let address = self.record_address(key);
        let raw = match self.store.read(&address).await? {
            Some(raw) => raw,
            None => return Ok(NO_WATERMARK),
        };

        let text = String::from_utf8_lossy(&raw);
        let text = text.trim();
        if text.is_empty() {
            return Ok(NO_WATERMARK);
        }

        let watermark: i64 = text.parse().map_err(|_| SyncError::CorruptRecord {
            address: address.to_string(),
            value: text.to_string(),
        })?;
        debug!(record = %address, watermark, "Read watermark");
        Ok(watermark)
    }

    #[instrument(skip(self))]
    async fn put(&self, key: &str, timestamp: i64) -> Result<()> {
        let address = self.record_address(key);
        self.store
            .write(&address, Bytes::from(timestamp.to_string()))
            .await?;
        Ok(())
    }
}
