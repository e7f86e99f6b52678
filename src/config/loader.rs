//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/screener.toml.
//! Every section is optional and falls back to the public endpoints.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::believe::{BelieveConfig, BELIEVE_BASE_URL, DEFAULT_ABSENCE_MARKER};
use crate::adapters::dexscreener::{DexScreenerConfig, DEXSCREENER_BASE_URL};
use crate::application::AggregatorConfig;
use crate::domain::PairSelection;

/// Main configuration structure matching config/screener.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub market_data: MarketDataSection,
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub refresh: RefreshSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// DexScreener API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataSection {
    /// DexScreener API base URL
    pub base_url: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        Self {
            base_url: DEXSCREENER_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl MarketDataSection {
    /// Get base URL with environment variable override
    /// Checks SCREENER_MARKET_DATA_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        std::env::var("SCREENER_MARKET_DATA_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Token registry configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// BelieveScreener site base URL
    pub base_url: String,
    /// Phrase that marks an unknown token page
    pub absence_marker: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            base_url: BELIEVE_BASE_URL.to_string(),
            absence_marker: DEFAULT_ABSENCE_MARKER.to_string(),
            timeout_secs: 10,
        }
    }
}

impl RegistrySection {
    /// Get base URL with environment variable override
    /// Checks SCREENER_REGISTRY_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        std::env::var("SCREENER_REGISTRY_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Aggregation pipeline configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Maximum registry checks / detail fetches in flight at once
    pub max_concurrency: usize,
    /// Per-request deadline in seconds
    pub request_timeout_secs: u64,
    /// Carry on with the remaining lists when one candidate list fails
    pub tolerate_source_failures: bool,
    /// Which pool represents a token: "first", "highest_liquidity", "highest_volume"
    pub pair_selection: PairSelection,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            request_timeout_secs: 15,
            tolerate_source_failures: false,
            pair_selection: PairSelection::default(),
        }
    }
}

/// Periodic refresh configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshSection {
    /// Seconds between refreshes
    pub interval_secs: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::ValidationError(format!("{} cannot be empty", field)));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got {}",
            field, url
        )));
    }
    Ok(())
}

/// Checks the URLs the adapters will actually use, after env overrides
fn validate_endpoints(market_data_url: &str, registry_url: &str) -> Result<(), ConfigError> {
    validate_url("SCREENER_MARKET_DATA_URL / market_data.base_url", market_data_url)?;
    validate_url("SCREENER_REGISTRY_URL / registry.base_url", registry_url)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("market_data.base_url", &self.market_data.base_url)?;
        validate_url("registry.base_url", &self.registry.base_url)?;
        validate_endpoints(&self.market_data.get_base_url(), &self.registry.get_base_url())?;

        if self.market_data.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "market_data.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.registry.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "registry.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.registry.absence_marker.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "registry.absence_marker cannot be empty".to_string(),
            ));
        }

        if self.pipeline.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.max_concurrency must be > 0, got {}",
                self.pipeline.max_concurrency
            )));
        }

        if self.pipeline.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "refresh.interval_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn dexscreener_config(&self) -> DexScreenerConfig {
        DexScreenerConfig {
            base_url: self.market_data.get_base_url(),
            timeout: Duration::from_secs(self.market_data.timeout_secs),
        }
    }

    pub fn believe_config(&self) -> BelieveConfig {
        BelieveConfig {
            base_url: self.registry.get_base_url(),
            absence_marker: self.registry.absence_marker.clone(),
            timeout: Duration::from_secs(self.registry.timeout_secs),
        }
    }
}

// Conversion from Config to AggregatorConfig
impl From<&Config> for AggregatorConfig {
    fn from(config: &Config) -> Self {
        AggregatorConfig {
            max_concurrency: config.pipeline.max_concurrency,
            request_timeout: Duration::from_secs(config.pipeline.request_timeout_secs),
            tolerate_source_failures: config.pipeline.tolerate_source_failures,
            pair_selection: config.pipeline.pair_selection,
        }
    }
}
