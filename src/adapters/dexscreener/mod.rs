//! DexScreener Adapter
//!
//! Implementation of the MarketDataPort for the public DexScreener API:
//! - `/token-boosts/latest/v1`, `/token-boosts/top/v1`, `/token-profiles/latest/v1`
//! - `/tokens/v1/{chain}/{address}`

mod client;

pub use client::{parse_candidates, parse_pairs, DexScreenerClient, DexScreenerConfig, DEXSCREENER_BASE_URL};
