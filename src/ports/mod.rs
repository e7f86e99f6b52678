//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Market data (candidate lists and pair details)
//! - Token registry presence checks
//!
//! `mocks` holds in-memory implementations for tests.

pub mod market_data;
pub mod registry;
pub mod mocks;

pub use market_data::{MarketDataError, MarketDataPort};
pub use registry::{RegistryClient, RegistryError};
