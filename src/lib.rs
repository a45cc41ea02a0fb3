//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-sync`). Deployments can depend
//! on `transferless-workspace` and enable the documented features without
//! needing to wire each crate individually.
//!
//! - `local-bridges` (default): the full worker stack with the local
//!   filesystem, in-memory and spool queue adapters.
//! - `core-only`: just the compilation and synchronization core, for hosts
//!   that bring their own `RemoteStore` and `TaskQueue` implementations.

#[cfg(feature = "local-bridges")]
pub use core_service;

#[cfg(feature = "core-only")]
pub use core_sync;
