//! Remote configuration provider abstraction
//!
//! The remote store needs connection settings (credentials, endpoints, root
//! directories) per backend. Providers fetch the raw configuration document
//! from wherever the deployment keeps it. The concrete provider is chosen once
//! at process start.

use async_trait::async_trait;

use crate::error::Result;

/// Source of the remote backend configuration document
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Short provider name, used in logs
    fn name(&self) -> &str;

    /// Fetch the raw configuration document
    async fn get_config(&self) -> Result<String>;
}
