//! Remote backend configuration
//!
//! The backend configuration document is a JSON object whose keys are backend
//! identifiers and whose values describe how to reach each backend:
//!
//! ```json
//! {
//!   "inbox":   { "type": "local", "root": "/srv/sftp/inbox" },
//!   "archive": { "type": "local", "root": "/mnt/archive" }
//! }
//! ```
//!
//! Identifiers double as configuration section names, so `/` is stripped
//! from them the same way job definitions strip it from their remotes.

use async_trait::async_trait;
use bridge_traits::{
    config::ConfigProvider,
    error::{BridgeError, Result},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::filesystem::LocalFsStore;

/// Connection settings for one backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendSettings {
    /// A directory on a locally mounted file system
    Local { root: PathBuf },
}

/// Parsed backend configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendsConfig {
    backends: BTreeMap<String, BackendSettings>,
}

impl BackendsConfig {
    /// Parse the JSON configuration document
    pub fn parse(document: &str) -> Result<Self> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, BackendSettings> = serde_json::from_str(document)
            .map_err(|e| {
                BridgeError::OperationFailed(format!("invalid backend configuration: {}", e))
            })?;

        let mut backends = BTreeMap::new();
        for (name, settings) in raw {
            let cleaned = name.replace('/', "");
            if cleaned.is_empty() {
                return Err(BridgeError::OperationFailed(format!(
                    "backend name '{}' is empty after cleaning",
                    name
                )));
            }
            if backends.insert(cleaned.clone(), settings).is_some() {
                return Err(BridgeError::OperationFailed(format!(
                    "backend '{}' is defined more than once",
                    cleaned
                )));
            }
        }

        Ok(Self { backends })
    }

    pub fn get(&self, backend: &str) -> Option<&BackendSettings> {
        self.backends.get(backend)
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Build a store serving every configured backend
    pub fn build_store(&self) -> LocalFsStore {
        self.backends
            .iter()
            .fold(LocalFsStore::new(), |store, (name, settings)| match settings {
                BackendSettings::Local { root } => store.with_backend(name.clone(), root.clone()),
            })
    }
}

/// Reads the backend configuration from a file
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_config(&self) -> Result<String> {
        let document = tokio::fs::read_to_string(&self.path).await?;
        debug!(path = ?self.path, "Loaded backend configuration file");
        Ok(document)
    }
}

/// Reads the backend configuration from an environment variable
pub struct EnvConfigProvider {
    variable: String,
}

impl EnvConfigProvider {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

#[async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_config(&self) -> Result<String> {
        match std::env::var(&self.variable) {
            Ok(document) => Ok(document),
            Err(std::env::VarError::NotPresent) => {
                info!(variable = %self.variable, "No backend configuration in environment");
                Ok(String::new())
            }
            Err(e) => Err(BridgeError::OperationFailed(format!(
                "cannot read {}: {}",
                self.variable, e
            ))),
        }
    }
}

/// Fetch and parse the backend configuration through `provider`
pub async fn load_backends(provider: &dyn ConfigProvider) -> Result<BackendsConfig> {
    let document = provider.get_config().await?;
    let config = BackendsConfig::parse(&document)?;
    info!(
        provider = provider.name(),
        backends = ?config.names(),
        "Loaded remote backend configuration"
    );
    Ok(config)
}
