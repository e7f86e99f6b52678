//! Pair selection
//!
//! The detail endpoint answers a single `(chain, address)` query with every
//! pool the token trades in. `PairSelection` decides which pool represents
//! the token.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pair::{Interval, PairDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSelection {
    /// Whatever the provider lists first
    First,
    /// Deepest pool by USD liquidity
    #[default]
    HighestLiquidity,
    /// Busiest pool by 24h USD volume
    HighestVolume,
}

impl PairSelection {
    /// Pick one pair. Ties keep the earliest pair; an empty list yields `None`.
    pub fn select(&self, pairs: Vec<PairDetail>) -> Option<PairDetail> {
        match self {
            PairSelection::First => pairs.into_iter().next(),
            PairSelection::HighestLiquidity => pick_max(pairs, PairDetail::liquidity_usd),
            PairSelection::HighestVolume => pick_max(pairs, |p| p.volume(Interval::H24)),
        }
    }
}

fn pick_max<F>(pairs: Vec<PairDetail>, score: F) -> Option<PairDetail>
where
    F: Fn(&PairDetail) -> f64,
{
    let mut best: Option<(f64, PairDetail)> = None;
    for pair in pairs {
        let value = score(&pair);
        let better = match &best {
            Some((best_value, _)) => value > *best_value,
            None => true,
        };
        if better {
            best = Some((value, pair));
        }
    }
    best.map(|(_, pair)| pair)
}

impl fmt::Display for PairSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PairSelection::First => "first",
            PairSelection::HighestLiquidity => "highest_liquidity",
            PairSelection::HighestVolume => "highest_volume",
        };
        f.write_str(name)
    }
}

impl FromStr for PairSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(PairSelection::First),
            "highest_liquidity" | "liquidity" => Ok(PairSelection::HighestLiquidity),
            "highest_volume" | "volume" => Ok(PairSelection::HighestVolume),
            other => Err(format!("unknown pair selection '{}'", other)),
        }
    }
}
