//! Remote Storage Abstractions
//!
//! Provides the platform-agnostic contract for the multi-backend object store
//! the transfer core operates on. Every object is addressed as
//! `<backend>:<path>`, where the backend identifier names a configured storage
//! system (an object-storage bucket, an SFTP endpoint, a local directory) and
//! the path is a `/`-separated key under it.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};
use crate::path;

/// Fully qualified location of an object or directory in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAddress {
    /// Backend identifier
    pub backend: String,
    /// Normalized `/`-separated path under the backend
    pub path: String,
}

impl RemoteAddress {
    /// Create an address, normalizing the path
    pub fn new(backend: impl Into<String>, path: impl AsRef<str>) -> Self {
        Self {
            backend: backend.into(),
            path: path::clean(path.as_ref()),
        }
    }

    /// Address of `segment` below this address
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        Self {
            backend: self.backend.clone(),
            path: path::join([self.path.as_str(), segment.as_ref()]),
        }
    }

    /// Address of the directory containing this object
    pub fn parent(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            path: path::dir(&self.path),
        }
    }

    /// Final path element
    pub fn file_name(&self) -> String {
        path::base(&self.path)
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.backend, self.path)
    }
}

impl FromStr for RemoteAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((backend, rest)) if !backend.is_empty() => Ok(Self::new(backend, rest)),
            _ => Err(BridgeError::InvalidAddress(format!(
                "expected <backend>:<path>, got '{}'",
                s
            ))),
        }
    }
}

/// Object information returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Path relative to the listed root
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time (Unix seconds)
    pub modified_at: i64,
}

/// Remote object store trait
///
/// The primitives the transfer core needs from a storage backend. All calls
/// are network-bound and may be slow; implementations must not retry
/// internally unless the backend protocol requires it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{RemoteAddress, RemoteStore};
///
/// async fn mirror(store: &dyn RemoteStore) -> Result<()> {
///     let from = RemoteAddress::new("inbox", "reports/q1.csv");
///     let to = RemoteAddress::new("archive", "2024/q1.csv");
///     store.copy(&from, &to).await
/// }
/// ```
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Recursively list every object under `root`
    ///
    /// Returned paths are relative to `root`. A root that does not exist
    /// yields an empty listing. Ordering is unspecified.
    async fn list(&self, root: &RemoteAddress) -> Result<Vec<ObjectInfo>>;

    /// Read a small object completely
    ///
    /// Returns `Ok(None)` if the object does not exist.
    async fn read(&self, address: &RemoteAddress) -> Result<Option<Bytes>>;

    /// Create or overwrite an object
    async fn write(&self, address: &RemoteAddress, data: Bytes) -> Result<()>;

    /// Atomically replace an object if its current content equals `expected`
    ///
    /// `expected = None` means the object must not exist. Returns `Ok(false)`
    /// when the precondition does not hold. Backends without a conditional
    /// write primitive return [`BridgeError::NotAvailable`].
    async fn compare_and_swap(
        &self,
        address: &RemoteAddress,
        _expected: Option<&[u8]>,
        _data: Bytes,
    ) -> Result<bool> {
        Err(BridgeError::NotAvailable(format!(
            "conditional write on backend '{}'",
            address.backend
        )))
    }

    /// Copy a single object, overwriting the destination
    async fn copy(&self, from: &RemoteAddress, to: &RemoteAddress) -> Result<()>;

    /// Delete a single object
    async fn delete(&self, address: &RemoteAddress) -> Result<()>;
}
