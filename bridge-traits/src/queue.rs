//! Task Queue Abstraction
//!
//! At-least-once message transport used to hand work between pipeline stages.
//! Bodies are opaque strings; the core encodes its messages as JSON.
//!
//! A received message stays invisible to other consumers until it is either
//! acknowledged (removed for good) or released (made visible again for
//! redelivery). Redelivery is the only retry mechanism in the system.

use async_trait::async_trait;

use crate::error::Result;

/// A message handed out by [`TaskQueue::receive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Stable message identifier
    pub id: String,
    /// Handle used to acknowledge or release this delivery
    pub receipt: String,
    /// Message body
    pub body: String,
    /// How many times this message has been handed out, including this one
    pub delivery_count: u32,
}

/// Task queue trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::queue::TaskQueue;
///
/// async fn drain(queue: &dyn TaskQueue) -> Result<()> {
///     for message in queue.receive(10).await? {
///         match handle(&message.body).await {
///             Ok(()) => queue.acknowledge(&message.receipt).await?,
///             Err(_) => queue.release(&message.receipt).await?,
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queue name, used in logs
    fn name(&self) -> &str;

    /// Append a message
    async fn send(&self, body: String) -> Result<()>;

    /// Take up to `max_messages` visible messages
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>>;

    /// Permanently remove a received message
    async fn acknowledge(&self, receipt: &str) -> Result<()>;

    /// Return a received message to the queue for redelivery
    async fn release(&self, receipt: &str) -> Result<()>;
}
