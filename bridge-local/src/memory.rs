//! In-process store and queue
//!
//! `MemoryStore` and `MemoryQueue` keep all state in memory. They back the
//! test suites and single-process embeddings, and they record every call so
//! callers can assert on ordering.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    queue::{QueueMessage, TaskQueue},
    storage::{ObjectInfo, RemoteAddress, RemoteStore},
    time::{Clock, SystemClock},
};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Store operation, used for call journaling and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Read,
    Write,
    CompareAndSwap,
    Copy,
    Delete,
}

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// Primary address (`from` for copies)
    pub address: String,
    /// Destination for copies
    pub destination: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified_at: i64,
}

#[derive(Default)]
struct StoreState {
    objects: BTreeMap<(String, String), StoredObject>,
    journal: Vec<StoreCall>,
    faults: HashSet<(StoreOp, String)>,
}

/// In-memory remote store
///
/// Objects are keyed by `(backend, path)`. Writes and copies stamp the
/// modification time from the injected clock. Conditional writes are
/// supported unless disabled with [`MemoryStore::without_conditional_writes`].
pub struct MemoryStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
    conditional_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
            conditional_writes: true,
        }
    }

    /// Behave like a backend without a compare-and-swap primitive
    pub fn without_conditional_writes(mut self) -> Self {
        self.conditional_writes = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key(address: &RemoteAddress) -> (String, String) {
        (address.backend.clone(), address.path.clone())
    }

    /// Seed an object with an explicit modification time
    pub fn put_object(&self, address: &RemoteAddress, data: impl Into<Bytes>, modified_at: i64) {
        self.lock().objects.insert(
            Self::key(address),
            StoredObject {
                data: data.into(),
                modified_at,
            },
        );
    }

    /// Current content of an object, bypassing journaling and faults
    pub fn get_object(&self, address: &RemoteAddress) -> Option<Bytes> {
        self.lock()
            .objects
            .get(&Self::key(address))
            .map(|o| o.data.clone())
    }

    pub fn contains(&self, address: &RemoteAddress) -> bool {
        self.lock().objects.contains_key(&Self::key(address))
    }

    /// Make every `op` against `address` fail with `OperationFailed`
    pub fn fail_on(&self, op: StoreOp, address: &RemoteAddress) {
        self.lock().faults.insert((op, address.to_string()));
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Every call made so far, in order
    pub fn journal(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    /// Calls of a single kind, in order
    pub fn calls(&self, op: StoreOp) -> Vec<StoreCall> {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    fn record(
        state: &mut StoreState,
        op: StoreOp,
        address: &RemoteAddress,
        destination: Option<&RemoteAddress>,
    ) -> Result<()> {
        state.journal.push(StoreCall {
            op,
            address: address.to_string(),
            destination: destination.map(|d| d.to_string()),
        });

        let injected = state.faults.contains(&(op, address.to_string()))
            || destination.is_some_and(|d| state.faults.contains(&(op, d.to_string())));
        if injected {
            return Err(BridgeError::OperationFailed(format!(
                "injected {:?} failure for {}",
                op, address
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn relative_to(root: &str, path: &str) -> Option<String> {
    if root == "." || root.is_empty() {
        return Some(path.to_string());
    }
    if root == "/" {
        return path.strip_prefix('/').map(str::to_string);
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, root: &RemoteAddress) -> Result<Vec<ObjectInfo>> {
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::List, root, None)?;

        let objects: Vec<ObjectInfo> = state
            .objects
            .iter()
            .filter(|((backend, _), _)| backend == &root.backend)
            .filter_map(|((_, path), object)| {
                relative_to(&root.path, path).map(|relative| ObjectInfo {
                    path: relative,
                    size: object.data.len() as u64,
                    modified_at: object.modified_at,
                })
            })
            .collect();

        debug!(root = %root, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn read(&self, address: &RemoteAddress) -> Result<Option<Bytes>> {
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::Read, address, None)?;
        Ok(state
            .objects
            .get(&Self::key(address))
            .map(|o| o.data.clone()))
    }

    async fn write(&self, address: &RemoteAddress, data: Bytes) -> Result<()> {
        let modified_at = self.clock.unix_timestamp();
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::Write, address, None)?;
        state
            .objects
            .insert(Self::key(address), StoredObject { data, modified_at });
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        address: &RemoteAddress,
        expected: Option<&[u8]>,
        data: Bytes,
    ) -> Result<bool> {
        if !self.conditional_writes {
            return Err(BridgeError::NotAvailable(format!(
                "conditional write on backend '{}'",
                address.backend
            )));
        }

        let modified_at = self.clock.unix_timestamp();
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::CompareAndSwap, address, None)?;

        let key = Self::key(address);
        let current = state.objects.get(&key).map(|o| o.data.as_ref());
        if current != expected {
            return Ok(false);
        }
        state.objects.insert(key, StoredObject { data, modified_at });
        Ok(true)
    }

    async fn copy(&self, from: &RemoteAddress, to: &RemoteAddress) -> Result<()> {
        let modified_at = self.clock.unix_timestamp();
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::Copy, from, Some(to))?;

        let data = state
            .objects
            .get(&Self::key(from))
            .map(|o| o.data.clone())
            .ok_or_else(|| BridgeError::NotFound(from.to_string()))?;
        state
            .objects
            .insert(Self::key(to), StoredObject { data, modified_at });
        Ok(())
    }

    async fn delete(&self, address: &RemoteAddress) -> Result<()> {
        let mut state = self.lock();
        Self::record(&mut state, StoreOp::Delete, address, None)?;
        state
            .objects
            .remove(&Self::key(address))
            .map(|_| ())
            .ok_or_else(|| BridgeError::NotFound(address.to_string()))
    }
}

#[derive(Debug, Clone)]
struct Envelope {
    id: String,
    body: String,
    delivery_count: u32,
}

#[derive(Default)]
struct QueueState {
    visible: VecDeque<Envelope>,
    in_flight: HashMap<String, Envelope>,
    rejected_sends: usize,
}

/// In-memory FIFO task queue with receive/acknowledge/release semantics
pub struct MemoryQueue {
    name: String,
    state: Mutex<QueueState>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reject the next `count` sends with `OperationFailed`
    pub fn reject_next_sends(&self, count: usize) {
        self.lock().rejected_sends = count;
    }

    /// Bodies of all visible messages, oldest first
    pub fn pending_bodies(&self) -> Vec<String> {
        self.lock().visible.iter().map(|e| e.body.clone()).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.lock().visible.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.lock().in_flight.len()
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<()> {
        let mut state = self.lock();
        if state.rejected_sends > 0 {
            state.rejected_sends -= 1;
            return Err(BridgeError::OperationFailed(format!(
                "queue '{}' rejected the message",
                self.name
            )));
        }
        state.visible.push_back(Envelope {
            id: Uuid::new_v4().to_string(),
            body,
            delivery_count: 0,
        });
        Ok(())
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>> {
        let mut state = self.lock();
        let mut messages = Vec::new();

        while messages.len() < max_messages {
            let Some(mut envelope) = state.visible.pop_front() else {
                break;
            };
            envelope.delivery_count += 1;
            let receipt = Uuid::new_v4().to_string();
            messages.push(QueueMessage {
                id: envelope.id.clone(),
                receipt: receipt.clone(),
                body: envelope.body.clone(),
                delivery_count: envelope.delivery_count,
            });
            state.in_flight.insert(receipt, envelope);
        }

        Ok(messages)
    }

    async fn acknowledge(&self, receipt: &str) -> Result<()> {
        self.lock()
            .in_flight
            .remove(receipt)
            .map(|_| ())
            .ok_or_else(|| BridgeError::NotFound(format!("receipt {}", receipt)))
    }

    async fn release(&self, receipt: &str) -> Result<()> {
        let mut state = self.lock();
        let envelope = state
            .in_flight
            .remove(receipt)
            .ok_or_else(|| BridgeError::NotFound(format!("receipt {}", receipt)))?;
        state.visible.push_back(envelope);
        Ok(())
    }
}
