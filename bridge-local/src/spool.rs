//! Directory-backed durable task queue
//!
//! Each queue is a directory with two subdirectories:
//!
//! ```text
//! <root>/<queue>/pending/<seq>-<id>.json   visible messages
//! <root>/<queue>/inflight/<seq>-<id>.json  received, not yet acknowledged
//! ```
//!
//! Receiving moves a file from `pending` to `inflight` with a rename, so two
//! consumers racing for the same message cannot both win it. Acknowledging
//! deletes the in-flight file; releasing renames it back to `pending`.
//! Messages abandoned in `inflight` by a crashed consumer can be returned with
//! [`SpoolQueue::requeue_in_flight`].

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    queue::{QueueMessage, TaskQueue},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const PENDING_DIR: &str = "pending";
const IN_FLIGHT_DIR: &str = "inflight";

#[derive(Debug, Serialize, Deserialize)]
struct SpoolEnvelope {
    id: String,
    delivery_count: u32,
    body: String,
}

/// File-system spool queue shared by processes on the same host or mount
pub struct SpoolQueue {
    name: String,
    pending: PathBuf,
    in_flight: PathBuf,
}

impl SpoolQueue {
    /// Open (and create if needed) the queue `name` under `root`
    pub async fn open(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(BridgeError::InvalidAddress(format!(
                "invalid queue name '{}'",
                name
            )));
        }

        let base = root.as_ref().join(&name);
        let pending = base.join(PENDING_DIR);
        let in_flight = base.join(IN_FLIGHT_DIR);
        fs::create_dir_all(&pending).await?;
        fs::create_dir_all(&in_flight).await?;

        debug!(queue = %name, path = ?base, "Opened spool queue");
        Ok(Self {
            name,
            pending,
            in_flight,
        })
    }

    async fn sorted_entries(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut read_dir = fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.ends_with(".json") {
                names.push(file_name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn write_envelope(path: &Path, envelope: &SpoolEnvelope) -> Result<()> {
        let encoded = serde_json::to_vec(envelope)
            .map_err(|e| BridgeError::OperationFailed(format!("encode message: {}", e)))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, encoded).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_envelope(path: &Path) -> Result<SpoolEnvelope> {
        let raw = fs::read(path).await?;
        serde_json::from_slice(&raw).map_err(|e| {
            BridgeError::OperationFailed(format!("decode message {}: {}", path.display(), e))
        })
    }

    fn receipt_path(&self, receipt: &str) -> Result<PathBuf> {
        if receipt.contains('/') || receipt.contains('\\') || !receipt.ends_with(".json") {
            return Err(BridgeError::NotFound(format!("receipt {}", receipt)));
        }
        Ok(self.in_flight.join(receipt))
    }

    /// Move every in-flight message back to pending
    ///
    /// Only safe when no other consumer of this queue is running.
    pub async fn requeue_in_flight(&self) -> Result<usize> {
        let names = Self::sorted_entries(&self.in_flight).await?;
        for name in &names {
            fs::rename(self.in_flight.join(name), self.pending.join(name)).await?;
        }
        if !names.is_empty() {
            warn!(queue = %self.name, count = names.len(), "Requeued abandoned in-flight messages");
        }
        Ok(names.len())
    }

    /// Number of visible messages
    pub async fn pending_len(&self) -> Result<usize> {
        Ok(Self::sorted_entries(&self.pending).await?.len())
    }
}

#[async_trait]
impl TaskQueue for SpoolQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let sequence = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = self.pending.join(format!("{:020}-{}.json", sequence, id));

        let envelope = SpoolEnvelope {
            id,
            delivery_count: 0,
            body,
        };
        Self::write_envelope(&path, &envelope).await?;
        debug!(queue = %self.name, id = %envelope.id, "Spooled message");
        Ok(())
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>> {
        let mut messages = Vec::new();

        for name in Self::sorted_entries(&self.pending).await? {
            if messages.len() >= max_messages {
                break;
            }

            let claimed = self.in_flight.join(&name);
            match fs::rename(self.pending.join(&name), &claimed).await {
                Ok(()) => {}
                // Another consumer claimed it first
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(BridgeError::Io(e)),
            }

            let mut envelope = Self::read_envelope(&claimed).await?;
            envelope.delivery_count += 1;
            Self::write_envelope(&claimed, &envelope).await?;

            messages.push(QueueMessage {
                id: envelope.id,
                receipt: name,
                body: envelope.body,
                delivery_count: envelope.delivery_count,
            });
        }

        debug!(queue = %self.name, count = messages.len(), "Received messages");
        Ok(messages)
    }

    async fn acknowledge(&self, receipt: &str) -> Result<()> {
        let path = self.receipt_path(receipt)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BridgeError::NotFound(format!("receipt {}", receipt)))
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn release(&self, receipt: &str) -> Result<()> {
        let path = self.receipt_path(receipt)?;
        match fs::rename(&path, self.pending.join(receipt)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BridgeError::NotFound(format!("receipt {}", receipt)))
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}
