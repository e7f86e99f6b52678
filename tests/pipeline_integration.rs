//! Aggregation Pipeline Integration Tests
//!
//! Integration tests that run the full pipeline against in-memory ports:
//! 1. Source lists -> Deduplicator ordering
//! 2. Existence filter against registry page bodies
//! 3. Detail join, pair selection and failure containment
//! 4. Bounded fan-out, timeouts and single-flight refresh
//!
//! All tests are deterministic (no real network calls) and use mock data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use boost_screener::adapters::believe::{page_indicates_absence, DEFAULT_ABSENCE_MARKER};
use boost_screener::adapters::dexscreener::parse_pairs;
use boost_screener::application::{
    AggregationReport, Aggregator, AggregatorConfig, RefreshOutcome, Refresher,
};
use boost_screener::domain::{
    dedupe_candidates, CandidateRecord, CandidateSource, PairDetail, PairSelection, TokenIdentity,
};
use boost_screener::ports::mocks::{StaticMarketData, StaticRegistry};
use boost_screener::ports::{MarketDataError, RegistryClient, RegistryError};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Registry that serves canned token pages and applies the absence check
struct PageRegistry {
    pages: HashMap<String, String>,
}

impl PageRegistry {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(address, body)| (address.to_string(), body.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl RegistryClient for PageRegistry {
    async fn exists(&self, address: &str) -> Result<bool, RegistryError> {
        match self.pages.get(address) {
            Some(body) => Ok(!page_indicates_absence(body, DEFAULT_ABSENCE_MARKER)),
            None => Err(RegistryError::Status(404)),
        }
    }
}

fn record(address: &str) -> CandidateRecord {
    CandidateRecord::new("solana", address)
}

fn create_mock_pair(address: &str, symbol: &str, liquidity_usd: f64, volume_h24: f64) -> PairDetail {
    serde_json::from_value(serde_json::json!({
        "chainId": "solana",
        "pairAddress": format!("{}-{}", address, liquidity_usd),
        "baseToken": {"address": address, "symbol": symbol},
        "priceUsd": "0.5",
        "liquidity": {"usd": liquidity_usd},
        "volume": {"h24": volume_h24}
    }))
    .unwrap()
}

fn aggregator(
    market: StaticMarketData,
    registry: impl RegistryClient + 'static,
    config: AggregatorConfig,
) -> Aggregator {
    Aggregator::new(Arc::new(market), Arc::new(registry), config)
}

fn symbols(pairs: &[PairDetail]) -> Vec<&str> {
    pairs.iter().filter_map(|p| p.base_symbol()).collect()
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn test_dedup_keeps_first_occurrence_across_lists() {
    let a = vec![record("X")];
    let b = vec![record("X")];
    let c = vec![record("Y")];

    let unique = dedupe_candidates([a.as_slice(), b.as_slice(), c.as_slice()]);

    assert_eq!(
        unique,
        vec![TokenIdentity::new("solana", "X"), TokenIdentity::new("solana", "Y")]
    );
}

#[test]
fn test_dedup_count_matches_distinct_keys() {
    let a = vec![record("A"), record("B"), record("A")];
    let b = vec![record("C"), CandidateRecord::new("base", "A")];
    let c = vec![record("B"), record("D")];

    let unique = dedupe_candidates([a.as_slice(), b.as_slice(), c.as_slice()]);

    let keys: Vec<String> = unique.iter().map(TokenIdentity::key).collect();
    assert_eq!(keys, vec!["solana:A", "solana:B", "solana:C", "base:A", "solana:D"]);
}

#[tokio::test]
async fn test_pipeline_dedups_before_registry() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("X")])
        .with_candidates(CandidateSource::TopBoosts, vec![record("X")])
        .with_candidates(CandidateSource::LatestProfiles, vec![record("Y")])
        .with_pairs("solana", "X", vec![create_mock_pair("X", "XX", 1.0, 1.0)])
        .with_pairs("solana", "Y", vec![create_mock_pair("Y", "YY", 1.0, 1.0)]);
    let registry = Arc::new(StaticRegistry::new().with_known(["X", "Y"]));

    let agg = Aggregator::new(Arc::new(market), registry.clone(), AggregatorConfig::default());
    let outcome = agg.run().await;

    assert_eq!(symbols(&outcome.pairs), vec!["XX", "YY"]);
    assert_eq!(registry.get_calls(), vec!["X", "Y"]);
}

// ============================================================================
// Existence Filter
// ============================================================================

#[tokio::test]
async fn test_not_found_page_is_excluded() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("Z"), record("V")])
        .with_pairs("solana", "V", vec![create_mock_pair("V", "VV", 1.0, 1.0)])
        .with_pairs("solana", "Z", vec![create_mock_pair("Z", "ZZ", 1.0, 1.0)]);
    let registry = PageRegistry::new(&[
        ("Z", "<html>Token not found</html>"),
        ("V", "<html><h1>VV</h1><p>Price</p></html>"),
    ]);

    let outcome = aggregator(market, registry, AggregatorConfig::default()).run().await;

    assert_eq!(symbols(&outcome.pairs), vec!["VV"]);
    assert_eq!(outcome.report.unregistered, vec![TokenIdentity::new("solana", "Z")]);
}

#[tokio::test]
async fn test_filter_output_is_ordered_subsequence() {
    let agg = aggregator(
        StaticMarketData::new(),
        StaticRegistry::new().with_known(["A", "C", "E"]),
        AggregatorConfig::default(),
    );
    let input: Vec<TokenIdentity> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|a| TokenIdentity::new("solana", *a))
        .collect();

    let mut report = AggregationReport::default();
    let output = agg.filter_registered(input.clone(), &mut report).await;

    assert_eq!(
        output,
        vec![
            TokenIdentity::new("solana", "A"),
            TokenIdentity::new("solana", "C"),
            TokenIdentity::new("solana", "E"),
        ]
    );
    let mut remaining = input.iter();
    assert!(output.iter().all(|id| remaining.any(|candidate| candidate == id)));
    assert_eq!(report.unregistered.len(), 2);
}

// ============================================================================
// Detail Join
// ============================================================================

#[tokio::test]
async fn test_empty_detail_is_excluded() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("W"), record("K")])
        .with_pairs("solana", "W", vec![])
        .with_pairs("solana", "K", vec![create_mock_pair("K", "KK", 1.0, 1.0)]);

    let outcome = aggregator(
        market,
        StaticRegistry::new().with_known(["W", "K"]),
        AggregatorConfig::default(),
    )
    .run()
    .await;

    assert_eq!(symbols(&outcome.pairs), vec!["KK"]);
    assert_eq!(outcome.report.verified, 2);
    assert_eq!(outcome.report.detail_failures.len(), 1);
    assert_eq!(outcome.report.detail_failures[0].identity, TokenIdentity::new("solana", "W"));
}

#[tokio::test]
async fn test_detail_fields_pass_through_verbatim() {
    let body = r#"[{"chainId":"solana","baseToken":{"address":"FOO1","symbol":"FOO"},"priceUsd":"0.001","priceNative":"0.0000067"}]"#;
    let pairs = parse_pairs(body).unwrap();
    let market = StaticMarketData::new().with_pairs("solana", "FOO1", pairs);

    let agg = aggregator(market, StaticRegistry::new(), AggregatorConfig::default());
    let detail = agg.fetch_token_detail("solana", "FOO1").await.unwrap();

    assert_eq!(detail.base_symbol(), Some("FOO"));
    assert_eq!(detail.price_usd.as_deref(), Some("0.001"));
    assert_eq!(detail.price_native.as_deref(), Some("0.0000067"));
}

#[tokio::test]
async fn test_join_only_contains_verified_identities() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("A"), record("B")])
        .with_candidates(CandidateSource::LatestProfiles, vec![record("C")])
        .with_pairs("solana", "A", vec![create_mock_pair("A", "AA", 1.0, 1.0)])
        .with_pairs("solana", "B", vec![create_mock_pair("B", "BB", 1.0, 1.0)])
        .with_pairs("solana", "C", vec![create_mock_pair("C", "CC", 1.0, 1.0)]);
    let market = Arc::new(market);

    let agg = Aggregator::new(
        market.clone(),
        Arc::new(StaticRegistry::new().with_known(["A", "C"])),
        AggregatorConfig::default(),
    );
    let outcome = agg.run().await;

    let identities: Vec<TokenIdentity> = outcome.pairs.iter().filter_map(PairDetail::identity).collect();
    assert_eq!(
        identities,
        vec![TokenIdentity::new("solana", "A"), TokenIdentity::new("solana", "C")]
    );
    assert!(!market.get_calls().contains(&"/tokens/v1/solana/B".to_string()));
}

#[tokio::test]
async fn test_pair_selection_rules() {
    let pairs = vec![
        create_mock_pair("P", "P", 1_000.0, 900_000.0),
        create_mock_pair("P", "P", 50_000.0, 10.0),
        create_mock_pair("P", "P", 20_000.0, 5_000.0),
    ];
    let market = || {
        StaticMarketData::new()
            .with_candidates(CandidateSource::TopBoosts, vec![record("P")])
            .with_pairs("solana", "P", pairs.clone())
    };

    let pick = |selection: PairSelection| {
        let market = market();
        async move {
            let config = AggregatorConfig {
                pair_selection: selection,
                ..Default::default()
            };
            let outcome = aggregator(market, StaticRegistry::new().with_known(["P"]), config)
                .run()
                .await;
            outcome.pairs[0].liquidity_usd()
        }
    };

    assert_eq!(pick(PairSelection::First).await, 1_000.0);
    assert_eq!(pick(PairSelection::HighestLiquidity).await, 50_000.0);
    assert_eq!(pick(PairSelection::HighestVolume).await, 1_000.0);
}

// ============================================================================
// Failure containment
// ============================================================================

#[tokio::test]
async fn test_source_failure_yields_empty_result() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("A")])
        .with_source_error(
            CandidateSource::LatestProfiles,
            MarketDataError::Parse("expected value at line 1 column 1".to_string()),
        );
    let registry = Arc::new(StaticRegistry::new().with_known(["A"]));

    let agg = Aggregator::new(Arc::new(market), registry.clone(), AggregatorConfig::default());
    let pairs = agg.refresh_aggregated_tokens().await;

    assert!(pairs.is_empty());
    assert!(registry.get_calls().is_empty());
}

#[tokio::test]
async fn test_tolerant_sources_keep_the_rest() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("A")])
        .with_source_error(
            CandidateSource::TopBoosts,
            MarketDataError::Status {
                endpoint: "/token-boosts/top/v1".to_string(),
                status: 429,
            },
        )
        .with_candidates(CandidateSource::LatestProfiles, vec![record("B")])
        .with_pairs("solana", "A", vec![create_mock_pair("A", "AA", 1.0, 1.0)])
        .with_pairs("solana", "B", vec![create_mock_pair("B", "BB", 1.0, 1.0)]);
    let config = AggregatorConfig {
        tolerate_source_failures: true,
        ..Default::default()
    };

    let outcome = aggregator(market, StaticRegistry::new().with_known(["A", "B"]), config)
        .run()
        .await;

    assert_eq!(symbols(&outcome.pairs), vec!["AA", "BB"]);
    assert!(!outcome.report.is_failed());
    assert!(outcome.report.is_degraded());
    assert_eq!(outcome.report.failed_sources[0].source, CandidateSource::TopBoosts);
}

#[tokio::test]
async fn test_all_sources_failing_aborts_even_when_tolerant() {
    let error = MarketDataError::Http("dns error".to_string());
    let market = StaticMarketData::new()
        .with_source_error(CandidateSource::LatestBoosts, error.clone())
        .with_source_error(CandidateSource::TopBoosts, error.clone())
        .with_source_error(CandidateSource::LatestProfiles, error);
    let config = AggregatorConfig {
        tolerate_source_failures: true,
        ..Default::default()
    };

    let outcome = aggregator(market, StaticRegistry::new(), config).run().await;

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.report.aborted.as_deref(), Some("all candidate sources failed"));
}

#[test]
fn test_registry_check_is_repeatable() {
    let registry = PageRegistry::new(&[("A", "<p>Listed</p>"), ("Z", "Token Not Found")]);

    tokio_test::block_on(async {
        for address in ["A", "Z"] {
            let first = registry.exists(address).await;
            let second = registry.exists(address).await;
            assert_eq!(first, second);
        }
        assert_eq!(registry.exists("A").await, Ok(true));
        assert_eq!(registry.exists("Z").await, Ok(false));
    });
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_registry_fan_out_is_bounded() {
    let addresses: Vec<String> = (0..20).map(|i| format!("T{}", i)).collect();
    let mut registry = StaticRegistry::new().with_known(addresses.iter().map(String::as_str));
    for address in &addresses {
        registry = registry.with_delay(address, Duration::from_millis(20));
    }
    let registry = Arc::new(registry);

    let market = StaticMarketData::new().with_candidates(
        CandidateSource::LatestBoosts,
        addresses.iter().map(|a| record(a)).collect(),
    );
    let config = AggregatorConfig {
        max_concurrency: 4,
        ..Default::default()
    };

    let agg = Aggregator::new(Arc::new(market), registry.clone(), config);
    let outcome = agg.run().await;

    assert_eq!(registry.get_calls().len(), 20);
    assert_eq!(registry.max_in_flight(), 4);
    assert_eq!(outcome.report.verified, 20);
}

#[tokio::test]
async fn test_hanging_requests_time_out() {
    let market = StaticMarketData::new()
        .with_candidates(
            CandidateSource::LatestBoosts,
            vec![record("HANG"), record("OK"), record("SLOWPAIR")],
        )
        .with_pairs("solana", "OK", vec![create_mock_pair("OK", "OK", 1.0, 1.0)])
        .with_pairs("solana", "SLOWPAIR", vec![create_mock_pair("SLOWPAIR", "SLOW", 1.0, 1.0)])
        .with_pair_delay("solana", "SLOWPAIR", Duration::from_secs(30));
    let registry = StaticRegistry::new()
        .with_known(["HANG", "OK", "SLOWPAIR"])
        .with_delay("HANG", Duration::from_secs(30));
    let config = AggregatorConfig {
        request_timeout: Duration::from_millis(50),
        ..Default::default()
    };

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        aggregator(market, registry, config).run(),
    )
    .await
    .expect("batch should complete despite hanging requests");

    assert_eq!(symbols(&outcome.pairs), vec!["OK"]);
    assert_eq!(outcome.report.registry_errors.len(), 1);
    assert_eq!(outcome.report.registry_errors[0].identity, TokenIdentity::new("solana", "HANG"));
    assert_eq!(outcome.report.detail_failures.len(), 1);
    assert!(outcome.report.detail_failures[0].error.contains("timed out"));
}

#[tokio::test]
async fn test_concurrent_refresh_is_single_flight() {
    let market = StaticMarketData::new()
        .with_candidates(CandidateSource::LatestBoosts, vec![record("A")])
        .with_pairs("solana", "A", vec![create_mock_pair("A", "AA", 1.0, 1.0)])
        .with_pair_delay("solana", "A", Duration::from_millis(100));
    let market = Arc::new(market);

    let agg = Aggregator::new(
        market.clone(),
        Arc::new(StaticRegistry::new().with_known(["A"])),
        AggregatorConfig::default(),
    );
    let refresher = Refresher::new(Arc::new(agg), Duration::from_secs(30));

    let (first, second, third) = tokio::join!(
        refresher.refresh_once(),
        refresher.refresh_once(),
        refresher.refresh_once(),
    );

    let outcomes = [first, second, third];
    let skipped = outcomes.iter().filter(|o| **o == RefreshOutcome::Skipped).count();
    assert_eq!(skipped, 2);
    assert_eq!(
        market
            .get_calls()
            .iter()
            .filter(|c| c.as_str() == "/tokens/v1/solana/A")
            .count(),
        1
    );
    assert_eq!(refresher.snapshot().await.unwrap().generation, 1);
}
