//! Simulated market data
//!
//! There is no upstream quote feed: prices are generated around a configured
//! base price per symbol. [`simulator`] holds the generation rules and
//! [`feed`] drives them from timers.

pub mod feed;
pub mod simulator;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use feed::{FeedSettings, FeedSnapshot, MarketFeed};
pub use simulator::MarketSimulator;

/// A simulated market observation for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Current quotes keyed by symbol
pub type QuoteMap = BTreeMap<String, Quote>;

/// Base price and volatility band for a simulated symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolProfile {
    pub base_price: f64,
    pub volatility: f64,
}

impl SymbolProfile {
    pub const fn new(base_price: f64, volatility: f64) -> Self {
        Self {
            base_price,
            volatility,
        }
    }

    /// A profile can only produce positive prices when the band stays above zero.
    pub fn is_valid(&self) -> bool {
        self.base_price.is_finite()
            && self.volatility.is_finite()
            && self.volatility >= 0.0
            && self.base_price - self.volatility > 0.0
    }
}

/// Symbols that receive the faster watchlist perturbation by default
pub const DEFAULT_WATCHLIST: [&str; 5] = ["AAPL", "TSLA", "GOOGL", "BTC", "ETH"];

/// Symbols shown by the market overview when none are requested
pub const MARKET_OVERVIEW: [&str; 6] = ["SPY", "QQQ", "DIA", "GLD", "BTC", "ETH"];

static DEFAULT_PROFILES: Lazy<HashMap<String, SymbolProfile>> = Lazy::new(|| {
    [
        ("AAPL", SymbolProfile::new(175.0, 5.0)),
        ("TSLA", SymbolProfile::new(250.0, 8.0)),
        ("GOOGL", SymbolProfile::new(135.0, 4.0)),
        ("BTC", SymbolProfile::new(28500.0, 1000.0)),
        ("ETH", SymbolProfile::new(1800.0, 100.0)),
        ("SPY", SymbolProfile::new(415.0, 2.5)),
        ("QQQ", SymbolProfile::new(350.0, 2.5)),
        ("DIA", SymbolProfile::new(340.0, 2.5)),
        ("GLD", SymbolProfile::new(185.0, 1.0)),
    ]
    .into_iter()
    .map(|(symbol, profile)| (symbol.to_string(), profile))
    .collect()
});

/// Built-in simulation profiles
pub fn default_profiles() -> HashMap<String, SymbolProfile> {
    DEFAULT_PROFILES.clone()
}
