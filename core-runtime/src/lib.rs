//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure shared by the transfer
//! processes:
//! - Logging and tracing infrastructure
//! - Configuration management, including the lock and target-failure policies
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the sync core and the
//! service binary depend on. It establishes the logging conventions and the
//! fail-fast configuration model used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LockMode, RemoteConfigService, RuntimeConfig, TargetFailurePolicy};
pub use error::{Error, Result};
