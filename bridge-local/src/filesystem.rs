//! Remote Store Implementation over the local file system using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{ObjectInfo, RemoteAddress, RemoteStore},
};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::debug;

/// Tokio-based remote store where every backend is a local directory
///
/// Useful for on-premise deployments (NFS mounts, SFTP drop directories
/// mounted locally) and for development:
/// - One root directory per backend identifier
/// - Object paths map to files below that root
/// - Copies overwrite the destination and create missing parent directories
///
/// Conditional writes are not supported, so the conditional lock mode is
/// unavailable on this store.
pub struct LocalFsStore {
    roots: HashMap<String, PathBuf>,
}

impl LocalFsStore {
    /// Create a store with no backends
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
        }
    }

    /// Register a backend identifier backed by `root`
    pub fn with_backend(mut self, backend: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(backend.into(), root.into());
        self
    }

    /// Backend identifiers this store serves
    pub fn backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roots.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve an address to a file system path
    fn resolve(&self, address: &RemoteAddress) -> Result<PathBuf> {
        let root = self.roots.get(&address.backend).ok_or_else(|| {
            BridgeError::InvalidAddress(format!("unknown backend '{}'", address.backend))
        })?;

        let relative = address.path.trim_start_matches('/');
        if relative == ".." || relative.starts_with("../") {
            return Err(BridgeError::InvalidAddress(format!(
                "{} escapes the backend root",
                address
            )));
        }

        if relative.is_empty() || relative == "." {
            Ok(root.clone())
        } else {
            Ok(root.join(relative))
        }
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn modified_secs(metadata: &std::fs::Metadata) -> i64 {
        metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl Default for LocalFsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for LocalFsStore {
    async fn list(&self, root: &RemoteAddress) -> Result<Vec<ObjectInfo>> {
        let base = self.resolve(root)?;
        let mut objects = Vec::new();

        match fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                debug!(root = %root, "Listing root is not a directory");
                return Ok(objects);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %root, "Listing root does not exist");
                return Ok(objects);
            }
            Err(e) => return Err(BridgeError::Io(e)),
        }

        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let relative = path
                    .strip_prefix(&base)
                    .map_err(|e| BridgeError::OperationFailed(e.to_string()))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");

                objects.push(ObjectInfo {
                    path: relative,
                    size: metadata.len(),
                    modified_at: Self::modified_secs(&metadata),
                });
            }
        }

        debug!(root = %root, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn read(&self, address: &RemoteAddress) -> Result<Option<Bytes>> {
        let path = self.resolve(address)?;
        match fs::read(&path).await {
            Ok(data) => {
                debug!(address = %address, size = data.len(), "Read object");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn write(&self, address: &RemoteAddress, data: Bytes) -> Result<()> {
        let path = self.resolve(address)?;
        Self::ensure_parent(&path).await?;
        fs::write(&path, data.as_ref()).await?;
        debug!(address = %address, size = data.len(), "Wrote object");
        Ok(())
    }

    async fn copy(&self, from: &RemoteAddress, to: &RemoteAddress) -> Result<()> {
        let source = self.resolve(from)?;
        let destination = self.resolve(to)?;

        if !fs::try_exists(&source).await? {
            return Err(BridgeError::NotFound(from.to_string()));
        }

        Self::ensure_parent(&destination).await?;
        let bytes = fs::copy(&source, &destination).await?;
        debug!(from = %from, to = %to, bytes, "Copied object");
        Ok(())
    }

    async fn delete(&self, address: &RemoteAddress) -> Result<()> {
        let path = self.resolve(address)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(address = %address, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BridgeError::NotFound(address.to_string()))
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalFsStore {
        LocalFsStore::new()
            .with_backend("inbox", dir.path().join("inbox"))
            .with_backend("archive", dir.path().join("archive"))
    }

    #[tokio::test]
    async fn test_write_read_and_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .write(&RemoteAddress::new("inbox", "reports/q1.csv"), Bytes::from("a,b"))
            .await
            .unwrap();
        store
            .write(&RemoteAddress::new("inbox", "top.txt"), Bytes::from("x"))
            .await
            .unwrap();

        let data = store
            .read(&RemoteAddress::new("inbox", "reports/q1.csv"))
            .await
            .unwrap();
        assert_eq!(data, Some(Bytes::from("a,b")));

        let mut listed: Vec<String> = store
            .list(&RemoteAddress::new("inbox", ""))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.path)
            .collect();
        listed.sort();
        assert_eq!(listed, vec!["reports/q1.csv", "top.txt"]);

        let nested = store
            .list(&RemoteAddress::new("inbox", "reports"))
            .await
            .unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].path, "q1.csv");
        assert_eq!(nested[0].size, 3);
        assert!(nested[0].modified_at > 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_listing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(dir.path().join("inbox")).unwrap();
        let looped = dir.path().join("inbox").join("loop");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();

        assert!(matches!(
            store.list(&RemoteAddress::new("inbox", "loop")).await,
            Err(BridgeError::Io(_))
        ));
        assert!(store
            .list(&RemoteAddress::new("inbox", "absent"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_missing_objects() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(
            store.read(&RemoteAddress::new("inbox", "nope")).await.unwrap(),
            None
        );
        assert!(store
            .list(&RemoteAddress::new("inbox", "nowhere"))
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .delete(&RemoteAddress::new("inbox", "nope"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_copy_across_backends_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let source = RemoteAddress::new("inbox", "reports/q1.csv");
        let target = RemoteAddress::new("archive", "2024/03/q1.csv");

        store.write(&source, Bytes::from("payload")).await.unwrap();
        store.copy(&source, &target).await.unwrap();
        store.delete(&source).await.unwrap();

        assert_eq!(store.read(&target).await.unwrap(), Some(Bytes::from("payload")));
        assert_eq!(store.read(&source).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_unknown_backend_and_escapes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let unknown = store.read(&RemoteAddress::new("ftp", "a")).await;
        assert!(matches!(unknown, Err(BridgeError::InvalidAddress(_))));

        let escape = store.read(&RemoteAddress::new("inbox", "../secret")).await;
        assert!(matches!(escape, Err(BridgeError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_conditional_write_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let result = store
            .compare_and_swap(&RemoteAddress::new("inbox", "mutex/job"), None, Bytes::from("true"))
            .await;
        assert!(matches!(result, Err(BridgeError::NotAvailable(_))));
    }
}
