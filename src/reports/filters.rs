//! Holding search, category/performance filters and grouping

use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::portfolio::gain_percent;
use crate::db::{Category, Holding};
use crate::error::TrackfolioError;
use crate::market::QuoteMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceFilter {
    /// Gain above 0%
    TopGainers,
    /// Gain below 0%
    TopLosers,
    /// Gain of 10% or more
    HighestGain,
    /// Loss of 5% or more
    LowestLoss,
}

impl PerformanceFilter {
    fn matches(&self, pct: f64) -> bool {
        match self {
            PerformanceFilter::TopGainers => pct > 0.0,
            PerformanceFilter::TopLosers => pct < 0.0,
            PerformanceFilter::HighestGain => pct >= 10.0,
            PerformanceFilter::LowestLoss => pct <= -5.0,
        }
    }
}

impl FromStr for PerformanceFilter {
    type Err = TrackfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "gainers" | "topgainers" => Ok(PerformanceFilter::TopGainers),
            "losers" | "toplosers" => Ok(PerformanceFilter::TopLosers),
            "highestgain" => Ok(PerformanceFilter::HighestGain),
            "lowestloss" => Ok(PerformanceFilter::LowestLoss),
            _ => Err(TrackfolioError::Validation(format!(
                "unknown performance filter '{}' (use gainers, losers, highest-gain, lowest-loss)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HoldingFilter {
    /// Case-insensitive substring of symbol or name
    pub search: Option<String>,
    /// Empty means every category
    pub categories: Vec<Category>,
    pub performance: Option<PerformanceFilter>,
}

impl HoldingFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.categories.is_empty()
            && self.performance.is_none()
    }

    /// Keep the holdings matching every active criterion, in input order.
    ///
    /// The performance criterion needs a quote; unquoted holdings never match it.
    pub fn apply(&self, holdings: &[Holding], quotes: &QuoteMap) -> Vec<Holding> {
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        holdings
            .iter()
            .filter(|h| match &needle {
                Some(n) => {
                    h.symbol.to_lowercase().contains(n) || h.name.to_lowercase().contains(n)
                }
                None => true,
            })
            .filter(|h| self.categories.is_empty() || self.categories.contains(&h.category))
            .filter(|h| match self.performance {
                Some(filter) => quotes.get(&h.symbol).is_some_and(|q| {
                    let cost = h.cost_basis();
                    filter.matches(gain_percent(h.quantity * q.price - cost, cost))
                }),
                None => true,
            })
            .cloned()
            .collect()
    }
}

/// Group holdings by category, keeping input order inside each group
pub fn group_by_category(holdings: &[Holding]) -> BTreeMap<Category, Vec<Holding>> {
    let mut groups: BTreeMap<Category, Vec<Holding>> = BTreeMap::new();
    for holding in holdings {
        groups.entry(holding.category).or_default().push(holding.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Quote;

    fn sample() -> (Vec<Holding>, QuoteMap) {
        let holdings = vec![
            Holding::new("AAPL", "Apple Inc.", Category::Stock, 10.0, 100.0),
            Holding::new("TSLA", "Tesla", Category::Stock, 2.0, 300.0),
            Holding::new("BTC", "Bitcoin", Category::Crypto, 1.0, 20000.0),
            Holding::new("XYZ", "Mystery Bond", Category::Bond, 5.0, 90.0),
        ];
        let quotes = [("AAPL", 120.0), ("TSLA", 270.0), ("BTC", 20500.0)]
            .iter()
            .map(|(s, p)| {
                (
                    s.to_string(),
                    Quote {
                        symbol: s.to_string(),
                        price: *p,
                        change: 0.0,
                        change_percent: 0.0,
                    },
                )
            })
            .collect();
        (holdings, quotes)
    }

    fn symbols(holdings: &[Holding]) -> Vec<&str> {
        holdings.iter().map(|h| h.symbol.as_str()).collect()
    }

    #[test]
    fn test_search_matches_symbol_or_name() {
        let (holdings, quotes) = sample();
        let filter = HoldingFilter {
            search: Some("bit".to_string()),
            ..Default::default()
        };
        assert_eq!(symbols(&filter.apply(&holdings, &quotes)), vec!["BTC"]);

        let filter = HoldingFilter {
            search: Some("aapl".to_string()),
            ..Default::default()
        };
        assert_eq!(symbols(&filter.apply(&holdings, &quotes)), vec!["AAPL"]);
    }

    #[test]
    fn test_category_filter() {
        let (holdings, quotes) = sample();
        let filter = HoldingFilter {
            categories: vec![Category::Stock, Category::Bond],
            ..Default::default()
        };
        assert_eq!(
            symbols(&filter.apply(&holdings, &quotes)),
            vec!["AAPL", "TSLA", "XYZ"]
        );
    }

    #[test]
    fn test_performance_filters() {
        let (holdings, quotes) = sample();
        let run = |perf| {
            let filter = HoldingFilter {
                performance: Some(perf),
                ..Default::default()
            };
            filter
                .apply(&holdings, &quotes)
                .into_iter()
                .map(|h| h.symbol)
                .collect::<Vec<_>>()
        };

        // AAPL +20%, TSLA -10%, BTC +2.5%, XYZ unquoted
        assert_eq!(run(PerformanceFilter::TopGainers), vec!["AAPL", "BTC"]);
        assert_eq!(run(PerformanceFilter::TopLosers), vec!["TSLA"]);
        assert_eq!(run(PerformanceFilter::HighestGain), vec!["AAPL"]);
        assert_eq!(run(PerformanceFilter::LowestLoss), vec!["TSLA"]);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let (holdings, quotes) = sample();
        let filter = HoldingFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&holdings, &quotes).len(), 4);
    }

    #[test]
    fn test_group_by_category() {
        let (holdings, _) = sample();
        let groups = group_by_category(&holdings);
        assert_eq!(groups.len(), 3);
        assert_eq!(symbols(&groups[&Category::Stock]), vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_parse_performance_filter() {
        assert_eq!(
            "highest-gain".parse::<PerformanceFilter>().unwrap(),
            PerformanceFilter::HighestGain
        );
        assert_eq!(
            "TOP_LOSERS".parse::<PerformanceFilter>().unwrap(),
            PerformanceFilter::TopLosers
        );
        assert!("best".parse::<PerformanceFilter>().is_err());
    }
}
