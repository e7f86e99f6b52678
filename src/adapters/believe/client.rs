//! BelieveScreener Registry Client
//!
//! BelieveScreener has no lookup API, so presence is read off the token page
//! rendered for users: `/token/{address}` renders a "Token not found" notice
//! for tokens it does not track.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ports::registry::{RegistryClient, RegistryError};

/// Public BelieveScreener site
pub const BELIEVE_BASE_URL: &str = "https://www.believescreener.com";

/// Phrase the token page shows for unknown tokens (compared lower-cased)
pub const DEFAULT_ABSENCE_MARKER: &str = "token not found";

#[derive(Debug, Clone)]
pub struct BelieveConfig {
    /// Site base URL, without trailing slash
    pub base_url: String,
    /// Absence phrase looked for in the page body
    pub absence_marker: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BelieveConfig {
    fn default() -> Self {
        Self {
            base_url: BELIEVE_BASE_URL.to_string(),
            absence_marker: DEFAULT_ABSENCE_MARKER.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Registry client that scrapes BelieveScreener token pages
#[derive(Debug, Clone)]
pub struct BelieveRegistry {
    config: BelieveConfig,
    http: Client,
}

impl BelieveRegistry {
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(BelieveConfig::default())
    }

    pub fn with_config(config: BelieveConfig) -> Result<Self, RegistryError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RegistryError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Token page URL. The chain is not part of it, so tokens sharing an
    /// address across chains are indistinguishable here.
    pub fn token_url(&self, address: &str) -> String {
        format!("{}/token/{}", self.config.base_url.trim_end_matches('/'), address)
    }

    pub fn absence_marker(&self) -> &str {
        &self.config.absence_marker
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Timeout(self.config.timeout)
        } else {
            RegistryError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl RegistryClient for BelieveRegistry {
    async fn exists(&self, address: &str) -> Result<bool, RegistryError> {
        let url = self.token_url(address);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() && !status.is_client_error() {
            return Err(RegistryError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.map_reqwest_error(e))?;
        let absent = page_indicates_absence(&body, &self.config.absence_marker);

        // The not-found page may be served with a 404; only a 4xx without the
        // marker is an unanswered check.
        if status.is_client_error() {
            if absent {
                tracing::debug!("{} answered {} with the absence marker", url, status);
                return Ok(false);
            }
            return Err(RegistryError::Status(status.as_u16()));
        }

        Ok(!absent)
    }
}

/// True when the page body carries the absence marker (case-insensitive)
pub fn page_indicates_absence(body: &str, marker: &str) -> bool {
    body.to_lowercase().contains(&marker.to_lowercase())
}
