//! Domain Layer - Core types and pure logic for the screener
//!
//! No I/O happens here; adapters fetch data and the application layer feeds
//! it through these types.
//!
//! - `token`: token identities and raw candidate records
//! - `dedup`: candidate deduplication
//! - `pair`: pair detail model and accessors
//! - `selection`: choosing one pair among several for a token
//! - `trend`: price trend reconstructed from interval changes
//! - `overview`: totals across a snapshot

pub mod token;
pub mod dedup;
pub mod pair;
pub mod selection;
pub mod trend;
pub mod overview;

pub use token::{CandidateRecord, CandidateSource, TokenIdentity};
pub use dedup::dedupe_candidates;
pub use pair::{Boosts, Interval, Liquidity, PairDetail, PairInfo, Social, TokenDescriptor, TxnCounts, Website};
pub use selection::PairSelection;
pub use trend::{Trend, TrendPoint, TrendSeries};
pub use overview::{format_usd, MarketOverview};
