//! DexScreener API Client
//!
//! HTTP client for the public DexScreener API. Implements `MarketDataPort`
//! for the boost/profile candidate lists and the per-token pair lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::{CandidateRecord, CandidateSource, PairDetail};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

/// Public DexScreener API
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com";

/// DexScreener client configuration
#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    /// Base URL for the API, without trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: DEXSCREENER_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl DexScreenerConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// DexScreener market data client
#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Client,
}

impl DexScreenerClient {
    /// Create a new client against the public API
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(DexScreenerConfig::default())
    }

    pub fn with_config(config: DexScreenerConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// URL of a candidate list
    pub fn candidates_url(&self, source: CandidateSource) -> String {
        format!("{}{}", self.base_url(), source.path())
    }

    /// URL of the per-token pair lookup
    pub fn pairs_url(&self, chain: &str, address: &str) -> String {
        format!("{}/tokens/v1/{}/{}", self.base_url(), chain, address)
    }

    /// GET a URL and return the body of a successful response
    async fn get_body(&self, url: &str) -> Result<String, MarketDataError> {
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.map_reqwest_error(e))
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> MarketDataError {
        if error.is_timeout() {
            MarketDataError::Timeout(self.config.timeout)
        } else {
            MarketDataError::Http(error.to_string())
        }
    }
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self {
            config: DexScreenerConfig::default(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl MarketDataPort for DexScreenerClient {
    async fn fetch_candidates(
        &self,
        source: CandidateSource,
    ) -> Result<Vec<CandidateRecord>, MarketDataError> {
        let body = self.get_body(&self.candidates_url(source)).await?;
        parse_candidates(&body)
    }

    async fn fetch_pairs(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Vec<PairDetail>, MarketDataError> {
        let body = self.get_body(&self.pairs_url(chain, address)).await?;
        parse_pairs(&body)
    }
}

/// Pair lookups answer with a bare array; the older search-style endpoints
/// wrap it as `{ "schemaVersion": ..., "pairs": [...] }`.
#[derive(Debug, Deserialize)]
struct WrappedPairs {
    #[serde(default)]
    pairs: Option<Vec<PairDetail>>,
}

/// Parse a candidate list body
pub fn parse_candidates(body: &str) -> Result<Vec<CandidateRecord>, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))
}

/// Parse a pair lookup body
pub fn parse_pairs(body: &str) -> Result<Vec<PairDetail>, MarketDataError> {
    let list_error = match serde_json::from_str::<Vec<PairDetail>>(body) {
        Ok(pairs) => return Ok(pairs),
        Err(e) => e,
    };

    match serde_json::from_str::<WrappedPairs>(body) {
        Ok(wrapped) => Ok(wrapped.pairs.unwrap_or_default()),
        // Report the error of the shape the body actually has
        Err(wrapped_error) if body.trim_start().starts_with('{') => {
            Err(MarketDataError::Parse(wrapped_error.to_string()))
        }
        Err(_) => Err(MarketDataError::Parse(list_error.to_string())),
    }
}
