//! Pair detail model
//!
//! Mirrors the DexScreener pair object. The provider omits fields freely, so
//! every field is optional and the accessors fall back to zero / `None`.
//! Prices stay as the provider's strings; parse them through the accessors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::token::TokenIdentity;

/// Interval keys used by `txns`, `volume` and `priceChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interval {
    M5,
    H1,
    H6,
    H24,
}

impl Interval {
    pub const ALL: [Interval; 4] = [Interval::M5, Interval::H1, Interval::H6, Interval::H24];

    pub fn key(&self) -> &'static str {
        match self {
            Interval::M5 => "m5",
            Interval::H1 => "h1",
            Interval::H6 => "h6",
            Interval::H24 => "h24",
        }
    }

    /// Interval length in minutes
    pub fn minutes(&self) -> i64 {
        match self {
            Interval::M5 => 5,
            Interval::H1 => 60,
            Interval::H6 => 360,
            Interval::H24 => 1440,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Base or quote token of a pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Buy/sell transaction counts for one interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCounts {
    #[serde(default, deserialize_with = "lenient_count")]
    pub buys: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub sells: u64,
}

impl TxnCounts {
    pub fn total(&self) -> u64 {
        self.buys + self.sells
    }
}

/// Pool liquidity in USD and in each side's native units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Website {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Social {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Auxiliary pair metadata (image, websites, socials)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websites: Option<Vec<Website>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<Vec<Social>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boosts {
    #[serde(default, deserialize_with = "lenient_boosts")]
    pub active: u32,
}

/// Full pair record as returned by `/tokens/v1/{chain}/{address}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_token: Option<TokenDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_token: Option<TokenDescriptor>,
    /// Price in quote-token units, verbatim from the provider
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub price_native: Option<String>,
    /// Price in USD, verbatim from the provider
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<String>,
    #[serde(default, deserialize_with = "lenient_map", skip_serializing_if = "Option::is_none")]
    pub txns: Option<BTreeMap<String, TxnCounts>>,
    #[serde(default, deserialize_with = "lenient_number_map", skip_serializing_if = "Option::is_none")]
    pub volume: Option<BTreeMap<String, f64>>,
    #[serde(default, deserialize_with = "lenient_number_map", skip_serializing_if = "Option::is_none")]
    pub price_change: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<Liquidity>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub fdv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    /// Pair creation time, epoch milliseconds
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub pair_created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<PairInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosts: Option<Boosts>,
}

/// Accept `"0.001"` or `0.001` and keep the textual form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

// Nested numerics: null, numeric strings and floats read as absent or zero
// rather than failing the pair.

fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(number_value))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
        .unwrap_or(0))
}

fn lenient_boosts<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u32::try_from(lenient_count(deserializer)?).unwrap_or(u32::MAX))
}

/// Epoch milliseconds, also accepted in float notation (`1.745e12`)
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|n| n as i64))
}

/// Interval map of numbers; entries that are not numbers are dropped
fn lenient_number_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|(key, value)| number_value(&value).map(|n| (key, n)))
            .collect()
    }))
}

/// Interval map of objects; entries that do not decode are dropped
fn lenient_map<'de, D, T>(deserializer: D) -> Result<Option<BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|(key, value)| serde_json::from_value(value).ok().map(|t| (key, t)))
            .collect()
    }))
}

fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

impl PairDetail {
    /// Identity of the base token this pair was fetched for
    pub fn identity(&self) -> Option<TokenIdentity> {
        let chain = self.chain_id.as_deref()?;
        let address = self.base_token.as_ref()?.address.as_deref()?;
        Some(TokenIdentity::new(chain, address))
    }

    pub fn base_symbol(&self) -> Option<&str> {
        self.base_token.as_ref()?.symbol.as_deref()
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_token.as_ref()?.name.as_deref()
    }

    pub fn quote_symbol(&self) -> Option<&str> {
        self.quote_token.as_ref()?.symbol.as_deref()
    }

    /// USD price parsed as a number, 0.0 when absent or unparseable
    pub fn price_usd_value(&self) -> f64 {
        parse_price(self.price_usd.as_deref())
    }

    pub fn price_native_value(&self) -> f64 {
        parse_price(self.price_native.as_deref())
    }

    /// Price change in percent over `interval`, if reported
    pub fn price_change_pct(&self, interval: Interval) -> Option<f64> {
        self.price_change.as_ref()?.get(interval.key()).copied()
    }

    pub fn price_change_or_zero(&self, interval: Interval) -> f64 {
        self.price_change_pct(interval).unwrap_or(0.0)
    }

    pub fn volume(&self, interval: Interval) -> f64 {
        self.volume
            .as_ref()
            .and_then(|v| v.get(interval.key()).copied())
            .unwrap_or(0.0)
    }

    pub fn txns(&self, interval: Interval) -> TxnCounts {
        self.txns
            .as_ref()
            .and_then(|t| t.get(interval.key()).copied())
            .unwrap_or_default()
    }

    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.and_then(|l| l.usd).unwrap_or(0.0)
    }

    pub fn market_cap_or_zero(&self) -> f64 {
        self.market_cap.unwrap_or(0.0)
    }

    pub fn fdv_or_zero(&self) -> f64 {
        self.fdv.unwrap_or(0.0)
    }

    pub fn active_boosts(&self) -> u32 {
        self.boosts.map(|b| b.active).unwrap_or(0)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.pair_created_at?)
    }

    /// Pair age relative to `now`; `None` without a creation timestamp
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.created_at().map(|created| now - created)
    }

    pub fn socials(&self) -> &[Social] {
        self.info
            .as_ref()
            .and_then(|i| i.socials.as_deref())
            .unwrap_or(&[])
    }

    pub fn websites(&self) -> &[Website] {
        self.info
            .as_ref()
            .and_then(|i| i.websites.as_deref())
            .unwrap_or(&[])
    }
}
