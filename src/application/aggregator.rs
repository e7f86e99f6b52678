//! Boosted Token Aggregator
//!
//! Runs the four-stage pipeline once per call:
//! 1. fetch the three candidate lists concurrently
//! 2. deduplicate by `(chain, address)` in first-seen order
//! 3. keep the tokens the registry knows about
//! 4. join each survivor with its pair detail
//!
//! Fan-outs are bounded by `max_concurrency` and every request carries a
//! deadline. Failures never escape: they are logged, recorded in the
//! `AggregationReport`, and the item contributes nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::domain::{
    dedupe_candidates, CandidateRecord, CandidateSource, MarketOverview, PairDetail, PairSelection,
    TokenIdentity,
};
use crate::ports::{MarketDataError, MarketDataPort, RegistryClient, RegistryError};

/// Aggregation pipeline settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum registry checks / detail fetches in flight at once
    pub max_concurrency: usize,
    /// Deadline for any single request
    pub request_timeout: Duration,
    /// Substitute an empty list for a failed source instead of aborting
    pub tolerate_source_failures: bool,
    /// Rule for choosing one pair per token
    pub pair_selection: PairSelection,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            request_timeout: Duration::from_secs(15),
            tolerate_source_failures: false,
            pair_selection: PairSelection::default(),
        }
    }
}

/// A candidate list that could not be fetched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: CandidateSource,
    pub error: String,
}

/// A token dropped because a request about it failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub identity: TokenIdentity,
    pub error: String,
}

/// What happened during one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationReport {
    /// Candidate records fetched across all lists
    pub candidates: usize,
    /// Identities left after deduplication
    pub unique: usize,
    /// Identities the registry confirmed
    pub verified: usize,
    /// Pairs in the final result
    pub joined: usize,
    pub failed_sources: Vec<SourceFailure>,
    /// Identities the registry answered for but does not know
    pub unregistered: Vec<TokenIdentity>,
    /// Identities whose registry check could not be completed
    pub registry_errors: Vec<ItemFailure>,
    /// Verified identities without a usable pair detail
    pub detail_failures: Vec<ItemFailure>,
    /// Set when the run gave up before producing results
    pub aborted: Option<String>,
    /// Set when the run was cancelled by a shutdown signal
    pub cancelled: bool,
}

impl AggregationReport {
    /// The run produced no meaningful result
    pub fn is_failed(&self) -> bool {
        self.aborted.is_some() || self.cancelled
    }

    /// The run finished but some requests failed along the way
    pub fn is_degraded(&self) -> bool {
        !self.failed_sources.is_empty()
            || !self.registry_errors.is_empty()
            || !self.detail_failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.cancelled {
            return "aggregation cancelled".to_string();
        }
        if let Some(reason) = &self.aborted {
            return format!("aggregation aborted: {}", reason);
        }
        format!(
            "{} candidates, {} unique, {} verified ({} unregistered, {} registry errors), {} joined ({} detail failures), {} failed sources",
            self.candidates,
            self.unique,
            self.verified,
            self.unregistered.len(),
            self.registry_errors.len(),
            self.joined,
            self.detail_failures.len(),
            self.failed_sources.len(),
        )
    }
}

/// Result of one aggregation run: the pairs and how they were obtained
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationOutcome {
    pub pairs: Vec<PairDetail>,
    pub report: AggregationReport,
}

impl AggregationOutcome {
    fn aborted(report: AggregationReport) -> Self {
        Self {
            pairs: Vec::new(),
            report,
        }
    }

    pub fn overview(&self) -> MarketOverview {
        MarketOverview::from_pairs(&self.pairs)
    }
}

/// Multi-source token aggregator
pub struct Aggregator {
    market_data: Arc<dyn MarketDataPort>,
    registry: Arc<dyn RegistryClient>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(
        market_data: Arc<dyn MarketDataPort>,
        registry: Arc<dyn RegistryClient>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            market_data,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Current aggregated token list. Never fails; any failure yields an
    /// empty or shorter list. Use `run` to see why.
    pub async fn refresh_aggregated_tokens(&self) -> Vec<PairDetail> {
        self.run().await.pairs
    }

    /// Run the full pipeline once
    pub async fn run(&self) -> AggregationOutcome {
        let mut report = AggregationReport::default();

        let lists = match self.fetch_sources(&mut report).await {
            Ok(lists) => lists,
            Err(reason) => {
                tracing::error!("Error processing boosted tokens: {}", reason);
                report.aborted = Some(reason);
                return AggregationOutcome::aborted(report);
            }
        };

        let unique = dedupe_candidates(lists.iter().map(Vec::as_slice));
        report.unique = unique.len();

        let verified = self.filter_registered(unique, &mut report).await;
        let pairs = self.join_details(verified, &mut report).await;

        tracing::info!("{}", report.summary());
        AggregationOutcome { pairs, report }
    }

    /// Run the pipeline unless `shutdown` resolves first. A cancelled run
    /// drops every in-flight request and returns an empty, cancelled outcome.
    pub async fn run_until<F>(&self, shutdown: F) -> AggregationOutcome
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            outcome = self.run() => outcome,
            _ = shutdown => {
                tracing::warn!("Aggregation cancelled");
                AggregationOutcome::aborted(AggregationReport {
                    cancelled: true,
                    ..Default::default()
                })
            }
        }
    }

    /// Single-token lookup: detail fetch only, no registry check.
    /// `None` on any failure.
    pub async fn fetch_token_detail(&self, chain: &str, address: &str) -> Option<PairDetail> {
        let identity = TokenIdentity::new(chain, address);
        let detail = select_detail(
            Arc::clone(&self.market_data),
            self.config.pair_selection,
            self.config.request_timeout,
            identity,
        )
        .await;

        match detail {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::error!("Failed to fetch info for {}: {}", address, e);
                None
            }
        }
    }

    /// Stage 1: fetch the three candidate lists concurrently.
    ///
    /// Lists come back in deduplication order. Returns `Err` when the run
    /// must stop: any failed source in strict mode, every source otherwise.
    pub async fn fetch_sources(
        &self,
        report: &mut AggregationReport,
    ) -> Result<Vec<Vec<CandidateRecord>>, String> {
        let [latest, top, profiles] = CandidateSource::ALL;
        let results = tokio::join!(
            self.fetch_source(latest),
            self.fetch_source(top),
            self.fetch_source(profiles),
        );

        let mut lists = Vec::with_capacity(CandidateSource::ALL.len());
        for (source, result) in CandidateSource::ALL.into_iter().zip([results.0, results.1, results.2]) {
            match result {
                Ok(records) => {
                    tracing::info!("Total {}: {}", source, records.len());
                    report.candidates += records.len();
                    lists.push(records);
                }
                Err(e) => {
                    tracing::error!("Failed to fetch {}: {}", source, e);
                    report.failed_sources.push(SourceFailure {
                        source,
                        error: e.to_string(),
                    });
                    lists.push(Vec::new());
                }
            }
        }

        let failed = report.failed_sources.len();
        if failed == CandidateSource::ALL.len() {
            return Err("all candidate sources failed".to_string());
        }
        if failed > 0 && !self.config.tolerate_source_failures {
            let names: Vec<String> = report
                .failed_sources
                .iter()
                .map(|f| f.source.to_string())
                .collect();
            return Err(format!("candidate source failed: {}", names.join(", ")));
        }

        Ok(lists)
    }

    async fn fetch_source(
        &self,
        source: CandidateSource,
    ) -> Result<Vec<CandidateRecord>, MarketDataError> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, self.market_data.fetch_candidates(source))
            .await
            .unwrap_or(Err(MarketDataError::Timeout(timeout)))
    }

    /// Stage 3: keep identities the registry knows about, in input order
    pub async fn filter_registered(
        &self,
        identities: Vec<TokenIdentity>,
        report: &mut AggregationReport,
    ) -> Vec<TokenIdentity> {
        let timeout = self.config.request_timeout;
        let registry = Arc::clone(&self.registry);

        // Each check owns its inputs so the whole run stays spawnable
        let checks: Vec<Result<bool, RegistryError>> = stream::iter(identities.clone())
            .map(move |identity| {
                let registry = Arc::clone(&registry);
                async move {
                    tokio::time::timeout(timeout, registry.exists(&identity.address))
                        .await
                        .unwrap_or(Err(RegistryError::Timeout(timeout)))
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut verified = Vec::with_capacity(identities.len());
        for (identity, check) in identities.into_iter().zip(checks) {
            match check {
                Ok(true) => verified.push(identity),
                Ok(false) => {
                    tracing::debug!("{} not found on registry", identity);
                    report.unregistered.push(identity);
                }
                Err(e) => {
                    tracing::error!("Error verifying {}: {}", identity.address, e);
                    report.registry_errors.push(ItemFailure {
                        identity,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("{} tokens found on registry", verified.len());
        report.verified = verified.len();
        verified
    }

    /// Stage 4: fetch a pair detail per identity, dropping failures, in input order
    pub async fn join_details(
        &self,
        identities: Vec<TokenIdentity>,
        report: &mut AggregationReport,
    ) -> Vec<PairDetail> {
        let market_data = Arc::clone(&self.market_data);
        let timeout = self.config.request_timeout;
        let selection = self.config.pair_selection;

        let details: Vec<Result<PairDetail, MarketDataError>> = stream::iter(identities.clone())
            .map(move |identity| {
                select_detail(Arc::clone(&market_data), selection, timeout, identity)
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut pairs = Vec::with_capacity(identities.len());
        for (identity, detail) in identities.into_iter().zip(details) {
            match detail {
                Ok(pair) => pairs.push(pair),
                Err(e) => {
                    tracing::error!("Failed to fetch info for {}: {}", identity.address, e);
                    report.detail_failures.push(ItemFailure {
                        identity,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.joined = pairs.len();
        pairs
    }
}

/// Fetch a token's pairs and apply the selection rule
async fn select_detail(
    market_data: Arc<dyn MarketDataPort>,
    selection: PairSelection,
    timeout: Duration,
    identity: TokenIdentity,
) -> Result<PairDetail, MarketDataError> {
    let TokenIdentity { chain, address } = identity;
    let pairs = tokio::time::timeout(timeout, market_data.fetch_pairs(&chain, &address))
        .await
        .unwrap_or(Err(MarketDataError::Timeout(timeout)))?;

    let available = pairs.len();
    let selected = selection
        .select(pairs)
        .ok_or_else(|| MarketDataError::NoPairs(format!("{}:{}", chain, address)))?;

    if available > 1 {
        tracing::debug!(
            "{}:{} has {} pairs, picked {} by {}",
            chain,
            address,
            available,
            selected.pair_address.as_deref().unwrap_or("?"),
            selection
        );
    }
    Ok(selected)
}
