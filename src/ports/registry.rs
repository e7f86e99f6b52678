use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Registry lookup error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Registry returned HTTP {0}")]
    Status(u16),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Presence check against the partner token registry.
///
/// `Ok(false)` means the registry answered and does not know the token;
/// `Err` means the registry could not be asked. The pipeline drops the token
/// in both cases but reports them separately.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn exists(&self, address: &str) -> Result<bool, RegistryError>;
}
