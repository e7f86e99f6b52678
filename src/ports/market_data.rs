use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CandidateRecord, CandidateSource, PairDetail};

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("No pairs returned for {0}")]
    NoPairs(String),
}

/// Read-only access to the market-data provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch one of the candidate lists (boosts or profiles)
    async fn fetch_candidates(
        &self,
        source: CandidateSource,
    ) -> Result<Vec<CandidateRecord>, MarketDataError>;

    /// Fetch every pair the provider lists for a token
    async fn fetch_pairs(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Vec<PairDetail>, MarketDataError>;
}
