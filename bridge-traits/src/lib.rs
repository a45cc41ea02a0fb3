//! # Host Bridge Traits
//!
//! Capability traits for the external collaborators of the transfer core.
//!
//! ## Overview
//!
//! This crate defines the contract between the core (job compilation and
//! synchronization) and the systems it drives. Each trait is a narrow adapter
//! seam: the core contains the algorithms, the implementations contain the
//! network plumbing.
//!
//! ## Traits
//!
//! - [`RemoteStore`](storage::RemoteStore) - list, read, write, copy, delete
//!   objects across `<backend>:<path>` addresses
//! - [`TaskQueue`](queue::TaskQueue) - at-least-once message transport between
//!   pipeline stages
//! - [`ConfigProvider`](config::ConfigProvider) - source of remote backend
//!   connection settings
//! - [`Clock`](time::Clock) - time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert backend-specific failures into it and include the address or
//! queue name involved.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! concurrently processed messages.

pub mod config;
pub mod error;
pub mod path;
pub mod queue;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use config::ConfigProvider;
pub use queue::{QueueMessage, TaskQueue};
pub use storage::{ObjectInfo, RemoteAddress, RemoteStore};
pub use time::{Clock, LogLevel, ManualClock, SystemClock};
