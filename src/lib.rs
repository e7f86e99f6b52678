//! Boost Screener - aggregated view of boosted DexScreener tokens
//!
//! Merges the DexScreener boost and profile feeds, keeps the tokens
//! BelieveScreener knows about, and joins each with its pair detail.
//!
//! # Modules
//!
//! - `domain`: Core types (TokenIdentity, PairDetail, PairSelection, dedup, trends)
//! - `ports`: Trait abstractions (MarketDataPort, RegistryClient)
//! - `adapters`: External implementations (DexScreener, BelieveScreener, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Aggregation pipeline and periodic refresher

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
