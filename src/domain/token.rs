//! Token identity and candidate records
//!
//! A `CandidateRecord` is one raw entry of a DexScreener boost/profile list.
//! Only the chain and token address survive into a `TokenIdentity`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a token on a specific chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenIdentity {
    /// Chain identifier (e.g. "solana")
    pub chain: String,
    /// Token address on that chain
    pub address: String,
}

impl TokenIdentity {
    pub fn new(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: address.into(),
        }
    }

    /// Composite uniqueness key `chain:address`
    pub fn key(&self) -> String {
        format!("{}:{}", self.chain, self.address)
    }
}

impl fmt::Display for TokenIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Raw entry from any of the three candidate lists.
///
/// Boost and profile entries carry a lot more (icon, links, boost amounts);
/// everything except the identity is dropped at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<String>,
    #[serde(rename = "tokenAddress", default)]
    pub token_address: Option<String>,
}

impl CandidateRecord {
    pub fn new(chain: &str, address: &str) -> Self {
        Self {
            chain_id: Some(chain.to_string()),
            token_address: Some(address.to_string()),
        }
    }

    /// Identity of this record. Missing fields are taken as empty strings,
    /// not rejected; such identities simply fail later at the network stage.
    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            chain: self.chain_id.clone().unwrap_or_default(),
            address: self.token_address.clone().unwrap_or_default(),
        }
    }
}

/// The three candidate lists published by the market-data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    LatestBoosts,
    TopBoosts,
    LatestProfiles,
}

impl CandidateSource {
    /// Concatenation order used by the deduplicator
    pub const ALL: [CandidateSource; 3] = [
        CandidateSource::LatestBoosts,
        CandidateSource::TopBoosts,
        CandidateSource::LatestProfiles,
    ];

    /// Endpoint path relative to the provider base URL
    pub fn path(&self) -> &'static str {
        match self {
            CandidateSource::LatestBoosts => "/token-boosts/latest/v1",
            CandidateSource::TopBoosts => "/token-boosts/top/v1",
            CandidateSource::LatestProfiles => "/token-profiles/latest/v1",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CandidateSource::LatestBoosts => "latest boosts",
            CandidateSource::TopBoosts => "top boosts",
            CandidateSource::LatestProfiles => "latest profiles",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
