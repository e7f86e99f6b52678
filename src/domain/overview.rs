//! Market overview across a snapshot of pairs

use serde::Serialize;

use super::pair::{Interval, PairDetail};

/// Totals shown above the token table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketOverview {
    pub active_pairs: usize,
    pub total_market_cap: f64,
    pub total_volume_24h: f64,
    pub total_liquidity_usd: f64,
    pub gainers_24h: usize,
    pub losers_24h: usize,
}

impl MarketOverview {
    pub fn from_pairs(pairs: &[PairDetail]) -> Self {
        pairs.iter().fold(Self::default(), |mut acc, pair| {
            acc.active_pairs += 1;
            acc.total_market_cap += pair.market_cap_or_zero();
            acc.total_volume_24h += pair.volume(Interval::H24);
            acc.total_liquidity_usd += pair.liquidity_usd();

            let change = pair.price_change_or_zero(Interval::H24);
            if change > 0.0 {
                acc.gainers_24h += 1;
            } else if change < 0.0 {
                acc.losers_24h += 1;
            }
            acc
        })
    }
}

/// Compact USD formatting: `$1.23B`, `$45.6M`, `$7.8K`, `$0.000123`
pub fn format_usd(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{}${:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}${:.1}M", sign, abs / 1e6)
    } else if abs >= 1e3 {
        format!("{}${:.1}K", sign, abs / 1e3)
    } else if abs >= 1.0 || abs == 0.0 {
        format!("{}${:.2}", sign, abs)
    } else {
        format!("{}${:.6}", sign, abs)
    }
}
