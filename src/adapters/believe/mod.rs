//! BelieveScreener Adapter
//!
//! Implementation of the RegistryClient port by scraping BelieveScreener
//! token pages. Swap in another `RegistryClient` once a structured lookup
//! API is available.

mod client;

pub use client::{
    page_indicates_absence, BelieveConfig, BelieveRegistry, BELIEVE_BASE_URL, DEFAULT_ABSENCE_MARKER,
};
