//! # Local Bridge Implementations
//!
//! Default implementations of the bridge traits for single-host deployments
//! and tests.
//!
//! ## Overview
//!
//! - `RemoteStore` over local directories using `tokio::fs` ([`LocalFsStore`])
//! - `RemoteStore` and `TaskQueue` held in memory ([`MemoryStore`],
//!   [`MemoryQueue`]) with call journaling and fault injection
//! - `TaskQueue` spooled to a directory ([`SpoolQueue`]) so separate
//!   `schedule`/`compile`/`synchronize` processes can hand work to each other
//! - `ConfigProvider` variants reading the backend configuration from a file
//!   or an environment variable
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_local::{load_backends, EnvConfigProvider, SpoolQueue};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backends = load_backends(&EnvConfigProvider::new("TRANSFERLESS_REMOTES")).await?;
//!     let store = backends.build_store();
//!     let jobs = SpoolQueue::open("/var/spool/transferless", "jobs").await?;
//!     // Hand to the core
//!     Ok(())
//! }
//! ```

mod backends;
mod filesystem;
mod memory;
mod spool;

pub use backends::{
    load_backends, BackendSettings, BackendsConfig, EnvConfigProvider, FileConfigProvider,
};
pub use filesystem::LocalFsStore;
pub use memory::{MemoryQueue, MemoryStore, StoreCall, StoreOp};
pub use spool::SpoolQueue;
