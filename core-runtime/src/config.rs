//! # Runtime Configuration Module
//!
//! Provides configuration management for the transfer scheduler, compiler and
//! synchronizer processes.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `RuntimeConfig`. Validation is fail-fast: a bad queue name or a zero worker
//! concurrency is rejected when the configuration is built, not when the first
//! message arrives.
//!
//! Settings that only one role needs (the job list location for `schedule`,
//! the data remote for `compile`) are optional at build time and reported as
//! missing capabilities when that role asks for them.
//!
//! ## Usage
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env().expect("invalid configuration");
//! let data_root = config.data_address()?;
//! ```
//!
//! ### Explicit
//!
//! ```ignore
//! use core_runtime::config::{LockMode, RuntimeConfig};
//!
//! let config = RuntimeConfig::builder()
//!     .data_remote("state")
//!     .data_root("transferless")
//!     .job_config("config", "jobs.json")
//!     .lock_mode(LockMode::Conditional)
//!     .worker_concurrency(8)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::logging::{LogFormat, LoggingConfig};
use bridge_traits::{path, storage::RemoteAddress, time::LogLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_JOB_QUEUE: &str = "transferless-jobs";
pub const DEFAULT_TRANSFER_QUEUE: &str = "transferless-transfers";
pub const DEFAULT_QUEUE_ROOT: &str = "./.transferless/queues";
pub const DEFAULT_REMOTE_CONFIG_VARIABLE: &str = "TRANSFERLESS_REMOTES";
pub const DEFAULT_WORKER_CONCURRENCY: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 10;

const MAX_WORKER_CONCURRENCY: usize = 256;
const MAX_BATCH_SIZE: usize = 1000;

// ============================================================================
// Policies
// ============================================================================

/// How the per-job lock record is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Read the record, then write `true` if it was not set. Two compilers
    /// racing between the read and the write can both win.
    #[default]
    Advisory,
    /// Swap `false` for `true` with the store's compare-and-swap. Fails when
    /// the store cannot do conditional writes.
    Conditional,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Advisory => "advisory",
            LockMode::Conditional => "conditional",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "advisory" => Ok(LockMode::Advisory),
            "conditional" => Ok(LockMode::Conditional),
            other => Err(Error::Config(format!(
                "Unknown lock mode '{}'. Expected 'advisory' or 'conditional'",
                other
            ))),
        }
    }
}

/// What a transfer does when copying to one of several targets fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFailurePolicy {
    /// Stop at the first failed target; the source is kept
    #[default]
    Abort,
    /// Attempt every target, report all failures, keep the source if any failed
    Continue,
}

impl TargetFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFailurePolicy::Abort => "abort",
            TargetFailurePolicy::Continue => "continue",
        }
    }
}

impl fmt::Display for TargetFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(TargetFailurePolicy::Abort),
            "continue" => Ok(TargetFailurePolicy::Continue),
            other => Err(Error::Config(format!(
                "Unknown target failure policy '{}'. Expected 'abort' or 'continue'",
                other
            ))),
        }
    }
}

/// Where the remote backend configuration document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteConfigService {
    /// Read from a file at this path
    File(PathBuf),
    /// Read from this environment variable
    Env(String),
}

impl Default for RemoteConfigService {
    fn default() -> Self {
        RemoteConfigService::Env(DEFAULT_REMOTE_CONFIG_VARIABLE.to_string())
    }
}

impl RemoteConfigService {
    /// Build from the service kind (`file` or `env`) and its source
    pub fn parse(kind: &str, source: Option<String>) -> Result<Self> {
        match kind.trim().to_lowercase().as_str() {
            "env" => Ok(RemoteConfigService::Env(
                source.unwrap_or_else(|| DEFAULT_REMOTE_CONFIG_VARIABLE.to_string()),
            )),
            "file" => source
                .filter(|s| !s.is_empty())
                .map(|s| RemoteConfigService::File(PathBuf::from(s)))
                .ok_or_else(|| {
                    Error::Config(
                        "TRANSFERLESS_REMOTE_CONFIG_SOURCE must name a file when the \
                         remote config service is 'file'"
                            .to_string(),
                    )
                }),
            other => Err(Error::Config(format!(
                "Unknown remote config service '{}'. Expected 'file' or 'env'",
                other
            ))),
        }
    }
}

// ============================================================================
// RuntimeConfig
// ============================================================================

/// Process configuration shared by every role
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Backend holding the job list
    pub job_config_remote: Option<String>,
    /// Bucket (prefix) of the job list
    pub job_config_bucket: String,
    /// Object path of the job list
    pub job_config_path: Option<String>,
    /// Backend holding lock and watermark records
    pub data_remote: Option<String>,
    /// Bucket (prefix) of the data root
    pub data_bucket: String,
    /// Data root below the bucket
    pub data_root: String,
    pub job_queue: String,
    pub transfer_queue: String,
    /// Directory holding the spool queues
    pub queue_root: PathBuf,
    pub remote_config: RemoteConfigService,
    pub lock_mode: LockMode,
    pub target_failure_policy: TargetFailurePolicy,
    /// Messages processed in parallel per drain
    pub worker_concurrency: usize,
    /// Messages received per drain
    pub batch_size: usize,
    pub log_format: LogFormat,
    pub log_level: LogLevel,
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("job_config", &self.job_config_address().ok())
            .field("data", &self.data_address().ok())
            .field("job_queue", &self.job_queue)
            .field("transfer_queue", &self.transfer_queue)
            .field("queue_root", &self.queue_root)
            .field("remote_config", &self.remote_config)
            .field("lock_mode", &self.lock_mode)
            .field("target_failure_policy", &self.target_failure_policy)
            .field("worker_concurrency", &self.worker_concurrency)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl RuntimeConfig {
    /// Creates a new builder for constructing a `RuntimeConfig`.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value. Unset and empty variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(remote) = get("TRANSFERLESS_JOB_CONFIG_REMOTE") {
            builder = builder.job_config_remote(remote);
        }
        if let Some(bucket) = get("TRANSFERLESS_JOB_CONFIG_BUCKET") {
            builder = builder.job_config_bucket(bucket);
        }
        if let Some(path) = get("TRANSFERLESS_JOB_CONFIG_PATH") {
            builder = builder.job_config_path(path);
        }
        if let Some(remote) = get("TRANSFERLESS_DATA_REMOTE") {
            builder = builder.data_remote(remote);
        }
        if let Some(bucket) = get("TRANSFERLESS_DATA_BUCKET") {
            builder = builder.data_bucket(bucket);
        }
        if let Some(root) = get("TRANSFERLESS_DATA_ROOT") {
            builder = builder.data_root(root);
        }
        if let Some(queue) = get("TRANSFERLESS_JOB_QUEUE") {
            builder = builder.job_queue(queue);
        }
        if let Some(queue) = get("TRANSFERLESS_TRANSFER_QUEUE") {
            builder = builder.transfer_queue(queue);
        }
        if let Some(root) = get("TRANSFERLESS_QUEUE_ROOT") {
            builder = builder.queue_root(root);
        }

        let service = get("TRANSFERLESS_REMOTE_CONFIG_SERVICE").unwrap_or_else(|| "env".into());
        builder = builder.remote_config(RemoteConfigService::parse(
            &service,
            get("TRANSFERLESS_REMOTE_CONFIG_SOURCE"),
        )?);

        if let Some(mode) = get("TRANSFERLESS_LOCK_MODE") {
            builder = builder.lock_mode(mode.parse()?);
        }
        if let Some(policy) = get("TRANSFERLESS_TARGET_FAILURE_POLICY") {
            builder = builder.target_failure_policy(policy.parse()?);
        }
        if let Some(concurrency) = get("TRANSFERLESS_WORKER_CONCURRENCY") {
            builder = builder.worker_concurrency(parse_count(
                "TRANSFERLESS_WORKER_CONCURRENCY",
                &concurrency,
            )?);
        }
        if let Some(batch) = get("TRANSFERLESS_BATCH_SIZE") {
            builder = builder.batch_size(parse_count("TRANSFERLESS_BATCH_SIZE", &batch)?);
        }
        if let Some(format) = get("TRANSFERLESS_LOG_FORMAT") {
            builder = builder.log_format(format.parse()?);
        }
        if let Some(level) = get("TRANSFERLESS_LOG_LEVEL") {
            builder = builder.log_level(level.parse().map_err(|_| {
                Error::Config(format!(
                    "TRANSFERLESS_LOG_LEVEL '{}' is not one of trace, debug, info, warn, error",
                    level
                ))
            })?);
        }

        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for (label, queue) in [
            ("job queue", &self.job_queue),
            ("transfer queue", &self.transfer_queue),
        ] {
            if queue.trim().is_empty() {
                return Err(Error::Config(format!("The {} name cannot be empty", label)));
            }
            if queue.contains('/') || queue.contains('\\') {
                return Err(Error::Config(format!(
                    "The {} name '{}' cannot contain path separators",
                    label, queue
                )));
            }
        }

        if self.job_queue == self.transfer_queue {
            return Err(Error::Config(format!(
                "Job and transfer queues must differ (both are '{}')",
                self.job_queue
            )));
        }

        if self.worker_concurrency == 0 || self.worker_concurrency > MAX_WORKER_CONCURRENCY {
            return Err(Error::Config(format!(
                "Worker concurrency must be between 1 and {} (got {})",
                MAX_WORKER_CONCURRENCY, self.worker_concurrency
            )));
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "Batch size must be between 1 and {} (got {})",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        for remote in [&self.job_config_remote, &self.data_remote]
            .into_iter()
            .flatten()
        {
            if remote.is_empty() {
                return Err(Error::Config(
                    "Remote names cannot be empty after removing '/'".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Address of the job list object
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` when the job list remote or path is
    /// not configured.
    pub fn job_config_address(&self) -> Result<RemoteAddress> {
        let remote = self.job_config_remote.as_ref().ok_or_else(|| {
            missing(
                "TRANSFERLESS_JOB_CONFIG_REMOTE",
                "The scheduler needs the backend holding the job list.",
            )
        })?;
        let object = self.job_config_path.as_ref().ok_or_else(|| {
            missing(
                "TRANSFERLESS_JOB_CONFIG_PATH",
                "The scheduler needs the object path of the job list.",
            )
        })?;
        Ok(RemoteAddress::new(
            remote.clone(),
            path::join([self.job_config_bucket.as_str(), object.as_str()]),
        ))
    }

    /// Address of the data root holding `mutex/` and `modtime/` records
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` when no data remote is configured.
    pub fn data_address(&self) -> Result<RemoteAddress> {
        let remote = self.data_remote.as_ref().ok_or_else(|| {
            missing(
                "TRANSFERLESS_DATA_REMOTE",
                "The compiler keeps lock and watermark records on this backend.",
            )
        })?;
        Ok(RemoteAddress::new(
            remote.clone(),
            path::join([self.data_bucket.as_str(), self.data_root.as_str()]),
        ))
    }

    /// Logging settings derived from this configuration
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::default()
            .with_format(self.log_format)
            .with_level(self.log_level)
    }
}

fn missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!("{} Set {} in the environment.", message, capability),
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer (got '{}')", name, value)))
}

fn clean_remote(remote: String) -> String {
    remote.replace('/', "")
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing a `RuntimeConfig`.
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    job_config_remote: Option<String>,
    job_config_bucket: Option<String>,
    job_config_path: Option<String>,
    data_remote: Option<String>,
    data_bucket: Option<String>,
    data_root: Option<String>,
    job_queue: Option<String>,
    transfer_queue: Option<String>,
    queue_root: Option<PathBuf>,
    remote_config: Option<RemoteConfigService>,
    lock_mode: Option<LockMode>,
    target_failure_policy: Option<TargetFailurePolicy>,
    worker_concurrency: Option<usize>,
    batch_size: Option<usize>,
    log_format: Option<LogFormat>,
    log_level: Option<LogLevel>,
}

impl RuntimeConfigBuilder {
    /// Backend holding the job list. `/` is removed.
    pub fn job_config_remote(mut self, remote: impl Into<String>) -> Self {
        self.job_config_remote = Some(clean_remote(remote.into()));
        self
    }

    pub fn job_config_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.job_config_bucket = Some(bucket.into());
        self
    }

    pub fn job_config_path(mut self, object: impl Into<String>) -> Self {
        self.job_config_path = Some(object.into());
        self
    }

    /// Shorthand for the job list remote and object path
    pub fn job_config(self, remote: impl Into<String>, object: impl Into<String>) -> Self {
        self.job_config_remote(remote).job_config_path(object)
    }

    /// Backend holding lock and watermark records. `/` is removed.
    pub fn data_remote(mut self, remote: impl Into<String>) -> Self {
        self.data_remote = Some(clean_remote(remote.into()));
        self
    }

    pub fn data_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.data_bucket = Some(bucket.into());
        self
    }

    pub fn data_root(mut self, root: impl Into<String>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    pub fn job_queue(mut self, name: impl Into<String>) -> Self {
        self.job_queue = Some(name.into());
        self
    }

    pub fn transfer_queue(mut self, name: impl Into<String>) -> Self {
        self.transfer_queue = Some(name.into());
        self
    }

    pub fn queue_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.queue_root = Some(root.into());
        self
    }

    pub fn remote_config(mut self, service: RemoteConfigService) -> Self {
        self.remote_config = Some(service);
        self
    }

    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = Some(mode);
        self
    }

    pub fn target_failure_policy(mut self, policy: TargetFailurePolicy) -> Self {
        self.target_failure_policy = Some(policy);
        self
    }

    pub fn worker_concurrency(mut self, concurrency: usize) -> Self {
        self.worker_concurrency = Some(concurrency);
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Builds the `RuntimeConfig`, validating it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a queue name, concurrency or batch size is
    /// invalid.
    pub fn build(self) -> Result<RuntimeConfig> {
        let config = RuntimeConfig {
            job_config_remote: self.job_config_remote,
            job_config_bucket: self.job_config_bucket.unwrap_or_default(),
            job_config_path: self.job_config_path,
            data_remote: self.data_remote,
            data_bucket: self.data_bucket.unwrap_or_default(),
            data_root: self.data_root.unwrap_or_default(),
            job_queue: self
                .job_queue
                .unwrap_or_else(|| DEFAULT_JOB_QUEUE.to_string()),
            transfer_queue: self
                .transfer_queue
                .unwrap_or_else(|| DEFAULT_TRANSFER_QUEUE.to_string()),
            queue_root: self
                .queue_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUEUE_ROOT)),
            remote_config: self.remote_config.unwrap_or_default(),
            lock_mode: self.lock_mode.unwrap_or_default(),
            target_failure_policy: self.target_failure_policy.unwrap_or_default(),
            worker_concurrency: self
                .worker_concurrency
                .unwrap_or(DEFAULT_WORKER_CONCURRENCY),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            log_format: self.log_format.unwrap_or(LogFormat::Pretty),
            log_level: self.log_level.unwrap_or(LogLevel::Info),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::builder().build().unwrap();

        assert_eq!(config.job_queue, DEFAULT_JOB_QUEUE);
        assert_eq!(config.transfer_queue, DEFAULT_TRANSFER_QUEUE);
        assert_eq!(config.queue_root, PathBuf::from(DEFAULT_QUEUE_ROOT));
        assert_eq!(config.lock_mode, LockMode::Advisory);
        assert_eq!(config.target_failure_policy, TargetFailurePolicy::Abort);
        assert_eq!(config.worker_concurrency, 4);
        assert_eq!(config.batch_size, 10);
        assert_eq!(
            config.remote_config,
            RemoteConfigService::Env("TRANSFERLESS_REMOTES".to_string())
        );
    }

    #[test]
    fn test_missing_data_remote_is_capability_error() {
        let config = RuntimeConfig::builder().build().unwrap();

        match config.data_address() {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "TRANSFERLESS_DATA_REMOTE");
                assert!(message.contains("lock and watermark"));
            }
            other => panic!("Expected CapabilityMissing, got {:?}", other),
        }
        assert!(matches!(
            config.job_config_address(),
            Err(Error::CapabilityMissing { .. })
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("TRANSFERLESS_DATA_REMOTE", "st/ate"),
            ("TRANSFERLESS_DATA_BUCKET", "bucket"),
            ("TRANSFERLESS_DATA_ROOT", "transferless"),
            ("TRANSFERLESS_JOB_CONFIG_REMOTE", "config"),
            ("TRANSFERLESS_JOB_CONFIG_PATH", "jobs.json"),
            ("TRANSFERLESS_LOCK_MODE", "Conditional"),
            ("TRANSFERLESS_TARGET_FAILURE_POLICY", "continue"),
            ("TRANSFERLESS_WORKER_CONCURRENCY", "8"),
            ("TRANSFERLESS_BATCH_SIZE", " "),
            ("TRANSFERLESS_REMOTE_CONFIG_SERVICE", "file"),
            ("TRANSFERLESS_REMOTE_CONFIG_SOURCE", "/etc/transferless/remotes.json"),
            ("TRANSFERLESS_LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(
            config.data_address().unwrap(),
            RemoteAddress::new("state", "bucket/transferless")
        );
        assert_eq!(
            config.job_config_address().unwrap(),
            RemoteAddress::new("config", "jobs.json")
        );
        assert_eq!(config.lock_mode, LockMode::Conditional);
        assert_eq!(config.target_failure_policy, TargetFailurePolicy::Continue);
        assert_eq!(config.worker_concurrency, 8);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.remote_config,
            RemoteConfigService::File(PathBuf::from("/etc/transferless/remotes.json"))
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(RuntimeConfig::from_lookup(lookup(&[("TRANSFERLESS_LOCK_MODE", "strict")])).is_err());
        assert!(
            RuntimeConfig::from_lookup(lookup(&[("TRANSFERLESS_WORKER_CONCURRENCY", "-1")]))
                .is_err()
        );
        assert!(RuntimeConfig::from_lookup(lookup(&[(
            "TRANSFERLESS_REMOTE_CONFIG_SERVICE",
            "file"
        )]))
        .is_err());
        assert!(
            RuntimeConfig::from_lookup(lookup(&[("TRANSFERLESS_LOG_LEVEL", "loud")])).is_err()
        );
    }

    #[test]
    fn test_validation() {
        let same_queues = RuntimeConfig::builder()
            .job_queue("q")
            .transfer_queue("q")
            .build();
        assert!(matches!(same_queues, Err(Error::Config(_))));

        let slash_queue = RuntimeConfig::builder().job_queue("a/b").build();
        assert!(slash_queue.is_err());

        assert!(RuntimeConfig::builder().worker_concurrency(0).build().is_err());
        assert!(RuntimeConfig::builder().batch_size(5000).build().is_err());
        assert!(RuntimeConfig::builder().data_remote("/").build().is_err());
    }

    #[test]
    fn test_empty_data_root_addresses_backend_root() {
        let config = RuntimeConfig::builder().data_remote("state").build().unwrap();
        let data = config.data_address().unwrap();
        assert_eq!(data.backend, "state");
        assert_eq!(data.join("mutex/nightly").path, "mutex/nightly");
    }

    #[test]
    fn test_debug_lists_addresses() {
        let config = RuntimeConfig::builder().data_remote("state").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("RuntimeConfig"));
        assert!(debug.contains("state"));
    }
}
