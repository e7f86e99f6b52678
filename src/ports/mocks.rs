use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CandidateRecord, CandidateSource, PairDetail, TokenIdentity};
use super::market_data::{MarketDataError, MarketDataPort};
use super::registry::{RegistryClient, RegistryError};

/// Mock market data port that records calls and serves canned responses
#[derive(Debug, Default)]
pub struct StaticMarketData {
    calls: Arc<Mutex<Vec<String>>>,
    candidates: HashMap<CandidateSource, Result<Vec<CandidateRecord>, MarketDataError>>,
    pairs: HashMap<String, Result<Vec<PairDetail>, MarketDataError>>,
    delays: HashMap<String, Duration>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the list served for a source
    pub fn with_candidates(mut self, source: CandidateSource, records: Vec<CandidateRecord>) -> Self {
        self.candidates.insert(source, Ok(records));
        self
    }

    pub fn with_source_error(mut self, source: CandidateSource, error: MarketDataError) -> Self {
        self.candidates.insert(source, Err(error));
        self
    }

    /// Builder method to set the pairs served for a token
    pub fn with_pairs(mut self, chain: &str, address: &str, pairs: Vec<PairDetail>) -> Self {
        self.pairs.insert(TokenIdentity::new(chain, address).key(), Ok(pairs));
        self
    }

    pub fn with_pair_error(mut self, chain: &str, address: &str, error: MarketDataError) -> Self {
        self.pairs.insert(TokenIdentity::new(chain, address).key(), Err(error));
        self
    }

    /// Delay the detail response for a token
    pub fn with_pair_delay(mut self, chain: &str, address: &str, delay: Duration) -> Self {
        self.delays.insert(TokenIdentity::new(chain, address).key(), delay);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

#[async_trait]
impl MarketDataPort for StaticMarketData {
    async fn fetch_candidates(
        &self,
        source: CandidateSource,
    ) -> Result<Vec<CandidateRecord>, MarketDataError> {
        self.record(source.path().to_string());
        self.candidates
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_pairs(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Vec<PairDetail>, MarketDataError> {
        let key = TokenIdentity::new(chain, address).key();
        self.record(format!("/tokens/v1/{}/{}", chain, address));

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        self.pairs
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(MarketDataError::Http(format!("No response configured for {}", key))))
    }
}

/// Mock registry that answers from a fixed set of known addresses.
/// Unknown addresses are reported as absent.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    calls: Arc<Mutex<Vec<String>>>,
    answers: HashMap<String, Result<bool, RegistryError>>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to mark addresses as known
    pub fn with_known<'a>(mut self, addresses: impl IntoIterator<Item = &'a str>) -> Self {
        for address in addresses {
            self.answers.insert(address.to_string(), Ok(true));
        }
        self
    }

    pub fn with_error(mut self, address: &str, error: RegistryError) -> Self {
        self.answers.insert(address.to_string(), Err(error));
        self
    }

    pub fn with_delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Highest number of checks observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for StaticRegistry {
    async fn exists(&self, address: &str) -> Result<bool, RegistryError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Yield so sibling checks get a chance to start
        match self.delays.get(address) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answers.get(address).cloned().unwrap_or(Ok(false))
    }
}
