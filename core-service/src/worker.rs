//! # Queue Worker
//!
//! Drains a task queue through a [`MessageHandler`].
//!
//! ## Overview
//!
//! One drain receives up to `batch_size` messages and handles up to
//! `concurrency` of them at a time. Each message is then settled:
//!
//! - success (including a skipped, locked job): acknowledged
//! - retryable failure: released for redelivery, until the message has been
//!   delivered `max_deliveries` times, after which it is acknowledged and
//!   logged as dropped
//! - failure that cannot succeed on redelivery (undecodable body, invalid
//!   job): acknowledged and logged as dropped
//!
//! The worker never retries by itself; the queue's redelivery is the only
//! retry mechanism. A settlement that the queue rejects is logged and counted
//! as unsettled; the message stays in flight until the queue hands it out
//! again.
//!
//! [`QueueWorker::run`] observes shutdown only while waiting for messages.
//! A batch that has been received is always handled to completion, so a
//! compilation is never cut off between taking and releasing its lock.

use crate::error::Result;
use crate::handlers::{HandlerOutcome, MessageHandler};
use bridge_traits::queue::{QueueMessage, TaskQueue};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_MAX_DELIVERIES: u32 = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Worker tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Messages received per drain
    pub batch_size: usize,
    /// Messages handled in parallel
    pub concurrency: usize,
    /// Deliveries after which a failing message is dropped
    pub max_deliveries: u32,
    /// Pause after a drain that found no messages
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: core_runtime::config::DEFAULT_BATCH_SIZE,
            concurrency: core_runtime::config::DEFAULT_WORKER_CONCURRENCY,
            max_deliveries: DEFAULT_MAX_DELIVERIES,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Counts from one drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub received: usize,
    pub succeeded: usize,
    /// Failed and released for redelivery
    pub released: usize,
    /// Failed and removed from the queue
    pub dropped: usize,
    /// Handled, but the acknowledge or release was rejected by the queue
    pub unsettled: usize,
}

impl DrainReport {
    pub fn failed(&self) -> usize {
        self.released + self.dropped + self.unsettled
    }

    fn absorb(&mut self, other: DrainReport) {
        self.received += other.received;
        self.succeeded += other.succeeded;
        self.released += other.released;
        self.dropped += other.dropped;
        self.unsettled += other.unsettled;
    }

    fn record(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::Succeeded => self.succeeded += 1,
            Settlement::Released => self.released += 1,
            Settlement::Dropped => self.dropped += 1,
            Settlement::Unsettled => self.unsettled += 1,
        }
    }
}

enum Settlement {
    Succeeded,
    Released,
    Dropped,
    Unsettled,
}

#[derive(Clone, Copy)]
enum Disposition {
    Acknowledge,
    Release,
}

pub struct QueueWorker {
    queue: Arc<dyn TaskQueue>,
    handler: Arc<dyn MessageHandler>,
    config: WorkerConfig,
}

impl QueueWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        handler: Arc<dyn MessageHandler>,
        config: WorkerConfig,
    ) -> Self {
        let config = WorkerConfig {
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
            max_deliveries: config.max_deliveries.max(1),
            ..config
        };
        Self {
            queue,
            handler,
            config,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn queue_name(&self) -> &str {
        self.queue.name()
    }

    /// Receive one batch and settle every message in it
    pub async fn drain_once(&self) -> Result<DrainReport> {
        let messages = self.queue.receive(self.config.batch_size).await?;
        Ok(self.handle_batch(messages).await)
    }

    /// Drain until a receive comes back empty or a batch makes no progress
    pub async fn drain_until_empty(&self) -> Result<DrainReport> {
        let mut total = DrainReport::default();
        loop {
            let report = self.drain_once().await?;
            total.absorb(report);
            if report.received == 0 || report.succeeded + report.dropped == 0 {
                return Ok(total);
            }
        }
    }

    /// Drain forever, pausing `poll_interval` whenever the queue is empty or
    /// cannot be read, until `shutdown` completes
    pub async fn run<F>(&self, shutdown: F) -> Result<DrainReport>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut total = DrainReport::default();

        loop {
            let received = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                received = self.queue.receive(self.config.batch_size) => received,
            };

            let idle = match received {
                Ok(messages) => {
                    let report = self.handle_batch(messages).await;
                    total.absorb(report);
                    report.received == 0
                }
                Err(e) => {
                    warn!(queue = self.queue.name(), error = %e, "Receive failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }

        info!(
            succeeded = total.succeeded,
            failed = total.failed(),
            "Worker stopped"
        );
        Ok(total)
    }

    #[instrument(skip(self, messages), fields(queue = self.queue.name(), stage = self.handler.stage()))]
    async fn handle_batch(&self, messages: Vec<QueueMessage>) -> DrainReport {
        let mut report = DrainReport {
            received: messages.len(),
            ..DrainReport::default()
        };
        if messages.is_empty() {
            return report;
        }

        let settlements: Vec<Settlement> = stream::iter(messages)
            .map(|message| self.process(message))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        for settlement in settlements {
            report.record(settlement);
        }

        info!(
            received = report.received,
            succeeded = report.succeeded,
            released = report.released,
            dropped = report.dropped,
            unsettled = report.unsettled,
            "Drained batch"
        );
        report
    }

    async fn process(&self, message: QueueMessage) -> Settlement {
        let (disposition, settlement) = match self.handler.handle(&message.body).await {
            Ok(outcome) => {
                match &outcome {
                    HandlerOutcome::Skipped { job } => {
                        info!(message = %message.id, job = %job, "Job locked, skipped")
                    }
                    other => debug!(message = %message.id, outcome = ?other, "Handled message"),
                }
                (Disposition::Acknowledge, Settlement::Succeeded)
            }
            Err(e) if !e.is_retryable() => {
                error!(message = %message.id, error = %e, "Dropping message that cannot succeed");
                (Disposition::Acknowledge, Settlement::Dropped)
            }
            Err(e) if message.delivery_count >= self.config.max_deliveries => {
                error!(
                    message = %message.id,
                    deliveries = message.delivery_count,
                    error = %e,
                    "Dropping message after repeated failures"
                );
                (Disposition::Acknowledge, Settlement::Dropped)
            }
            Err(e) => {
                warn!(
                    message = %message.id,
                    deliveries = message.delivery_count,
                    error = %e,
                    "Message failed, releasing for redelivery"
                );
                (Disposition::Release, Settlement::Released)
            }
        };

        let settled = match disposition {
            Disposition::Acknowledge => self.queue.acknowledge(&message.receipt).await,
            Disposition::Release => self.queue.release(&message.receipt).await,
        };
        match settled {
            Ok(()) => settlement,
            Err(e) => {
                error!(message = %message.id, error = %e, "Failed to settle message");
                Settlement::Unsettled
            }
        }
    }
}
