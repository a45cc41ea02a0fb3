//! Bootstrap from a [`RuntimeConfig`] using the local bridges

use crate::{CoreDependencies, CoreError, CoreService, Result};
use bridge_local::{load_backends, EnvConfigProvider, FileConfigProvider, SpoolQueue};
use bridge_traits::config::ConfigProvider;
use core_runtime::config::{RemoteConfigService, RuntimeConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Provider selected by the remote config service setting
pub fn config_provider(service: &RemoteConfigService) -> Box<dyn ConfigProvider> {
    match service {
        RemoteConfigService::File(path) => Box::new(FileConfigProvider::new(path.clone())),
        RemoteConfigService::Env(variable) => Box::new(EnvConfigProvider::new(variable.clone())),
    }
}

/// Build a [`CoreService`] backed by local directories and spool queues.
///
/// The backend configuration is fetched once, through the provider named by
/// `config.remote_config`.
pub async fn bootstrap(config: RuntimeConfig) -> Result<CoreService> {
    let provider = config_provider(&config.remote_config);
    let backends = load_backends(provider.as_ref())
        .await
        .map_err(|e| CoreError::InitializationFailed(format!("remote configuration: {}", e)))?;
    if backends.is_empty() {
        warn!(
            provider = provider.name(),
            "No remote backends configured; every remote address will be rejected"
        );
    }

    let job_queue = SpoolQueue::open(&config.queue_root, config.job_queue.clone()).await?;
    let transfer_queue =
        SpoolQueue::open(&config.queue_root, config.transfer_queue.clone()).await?;

    info!(
        backends = ?backends.names(),
        queue_root = ?config.queue_root,
        lock_mode = %config.lock_mode,
        target_failure_policy = %config.target_failure_policy,
        "Core service bootstrapped"
    );

    let deps = CoreDependencies::new(
        Arc::new(backends.build_store()),
        Arc::new(job_queue),
        Arc::new(transfer_queue),
    );
    Ok(CoreService::new(config, deps))
}
