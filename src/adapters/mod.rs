//! Adapters Layer - External system implementations
//!
//! - `dexscreener`: DexScreener public API (MarketDataPort)
//! - `believe`: BelieveScreener token pages (RegistryClient)
//! - `cli`: command-line interface

pub mod believe;
pub mod cli;
pub mod dexscreener;
