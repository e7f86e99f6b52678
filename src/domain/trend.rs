//! Price trend derived from interval price changes
//!
//! The provider reports a percentage change per interval, not a price
//! history. Each change implies the price one interval ago:
//! `past = now / (1 + change / 100)`.

use serde::Serialize;

use super::pair::{Interval, PairDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Trend::Up
        } else if change_pct < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "─",
        }
    }
}

/// One reconstructed price point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub minutes_ago: i64,
    pub price_usd: f64,
}

/// Oldest-first price points ending at the current price
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Build the series for a pair. Empty when the pair has no usable price.
    pub fn from_pair(pair: &PairDetail) -> Self {
        let now_price = pair.price_usd_value();
        if now_price <= 0.0 {
            return Self::default();
        }

        let mut points: Vec<TrendPoint> = Interval::ALL
            .iter()
            .rev()
            .filter_map(|interval| {
                let change = pair.price_change_pct(*interval)?;
                let factor = 1.0 + change / 100.0;
                (factor > 0.0).then(|| TrendPoint {
                    minutes_ago: interval.minutes(),
                    price_usd: now_price / factor,
                })
            })
            .collect();

        points.push(TrendPoint {
            minutes_ago: 0,
            price_usd: now_price,
        });

        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Direction from the oldest point to now
    pub fn trend(&self) -> Trend {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Trend::from_change(last.price_usd - first.price_usd),
            _ => Trend::Flat,
        }
    }

    /// Lowest and highest price in the series
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut prices = self.points.iter().map(|p| p.price_usd);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pair_with(price: &str, changes: &[(&str, f64)]) -> PairDetail {
        let map: BTreeMap<String, f64> = changes.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        PairDetail {
            price_usd: Some(price.to_string()),
            price_change: Some(map),
            ..Default::default()
        }
    }

    #[test]
    fn test_trend_from_change() {
        assert_eq!(Trend::from_change(1.5), Trend::Up);
        assert_eq!(Trend::from_change(-0.1), Trend::Down);
        assert_eq!(Trend::from_change(0.0), Trend::Flat);
    }

    #[test]
    fn test_series_reconstructs_past_prices() {
        let pair = pair_with("2.0", &[("h24", 100.0), ("h1", -50.0)]);
        let series = TrendSeries::from_pair(&pair);

        assert_eq!(
            series.points,
            vec![
                TrendPoint { minutes_ago: 1440, price_usd: 1.0 },
                TrendPoint { minutes_ago: 60, price_usd: 4.0 },
                TrendPoint { minutes_ago: 0, price_usd: 2.0 },
            ]
        );
        assert_eq!(series.trend(), Trend::Up);
        assert_eq!(series.range(), Some((1.0, 4.0)));
    }

    #[test]
    fn test_series_skips_impossible_change() {
        let pair = pair_with("1.0", &[("h24", -100.0), ("m5", 0.0)]);
        let series = TrendSeries::from_pair(&pair);

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].minutes_ago, 5);
        assert_eq!(series.trend(), Trend::Flat);
    }

    #[test]
    fn test_series_empty_without_price() {
        let pair = pair_with("0", &[("h24", 10.0)]);
        let series = TrendSeries::from_pair(&pair);
        assert!(series.is_empty());
        assert_eq!(series.trend(), Trend::Flat);
        assert!(series.range().is_none());
    }

    #[test]
    fn test_series_downtrend() {
        let pair = pair_with("0.5", &[("h24", -50.0)]);
        let series = TrendSeries::from_pair(&pair);
        assert_eq!(series.trend(), Trend::Down);
    }
}
