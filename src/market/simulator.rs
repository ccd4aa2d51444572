//! Quote generation rules.
//!
//! A full tick draws every known symbol around its base price:
//!
//! - price = base ± U(volatility)
//! - change = ± U(volatility / 2)
//! - change % = change / price × 100
//!
//! A watchlist tick nudges quotes that already exist: the price moves by up
//! to 1% of itself and the change by up to half of its magnitude.
//! Every published number is rounded to cents.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::debug;

use super::{default_profiles, Quote, QuoteMap, SymbolProfile};
use crate::error::TrackfolioError;
use crate::utils::round2;

/// Generator of synthetic quotes
pub struct MarketSimulator<R: Rng = StdRng> {
    profiles: HashMap<String, SymbolProfile>,
    rng: R,
}

impl MarketSimulator<StdRng> {
    /// Simulator seeded from the operating system
    pub fn new(profiles: HashMap<String, SymbolProfile>) -> Self {
        Self::with_rng(profiles, StdRng::from_os_rng())
    }

    /// Deterministic simulator, for reproducible runs
    pub fn seeded(profiles: HashMap<String, SymbolProfile>, seed: u64) -> Self {
        Self::with_rng(profiles, StdRng::seed_from_u64(seed))
    }
}

impl Default for MarketSimulator<StdRng> {
    fn default() -> Self {
        Self::new(default_profiles())
    }
}

impl<R: Rng> MarketSimulator<R> {
    pub fn with_rng(profiles: HashMap<String, SymbolProfile>, rng: R) -> Self {
        Self { profiles, rng }
    }

    pub fn profile(&self, symbol: &str) -> Option<&SymbolProfile> {
        self.profiles.get(symbol)
    }

    /// Generate a fresh quote for every requested symbol with a profile.
    ///
    /// Symbols without a profile are left out. A malformed profile fails the
    /// whole tick so callers can keep their previous map.
    pub fn generate<S: AsRef<str>>(&mut self, symbols: &[S]) -> Result<QuoteMap, TrackfolioError> {
        let mut quotes = QuoteMap::new();

        for symbol in symbols {
            let symbol = symbol.as_ref();
            let Some(profile) = self.profiles.get(symbol).copied() else {
                debug!("No simulation profile for {}, skipping", symbol);
                continue;
            };

            if !profile.is_valid() {
                return Err(TrackfolioError::Generation(format!(
                    "invalid profile for {}: base {} volatility {}",
                    symbol, profile.base_price, profile.volatility
                )));
            }

            let price = random_movement(&mut self.rng, profile.base_price, profile.volatility);
            let change = random_movement(&mut self.rng, 0.0, profile.volatility / 2.0);
            quotes.insert(symbol.to_string(), make_quote(symbol, price, change)?);
        }

        Ok(quotes)
    }

    /// Apply the smaller watchlist movement to the given symbols.
    ///
    /// Returns a new map; symbols missing from `current` stay missing.
    pub fn perturb<S: AsRef<str>>(
        &mut self,
        current: &QuoteMap,
        watchlist: &[S],
    ) -> Result<QuoteMap, TrackfolioError> {
        let mut updated = current.clone();

        for symbol in watchlist {
            let symbol = symbol.as_ref();
            let Some(previous) = current.get(symbol) else {
                continue;
            };

            let price = random_movement(&mut self.rng, previous.price, previous.price * 0.01);
            let change =
                random_movement(&mut self.rng, previous.change, previous.change.abs() * 0.5);
            updated.insert(symbol.to_string(), make_quote(symbol, price, change)?);
        }

        Ok(updated)
    }
}

/// `center` plus a uniform offset in `[-band, +band]`
fn random_movement<R: Rng>(rng: &mut R, center: f64, band: f64) -> f64 {
    if band <= 0.0 {
        return center;
    }
    center + rng.random_range(-band..=band)
}

fn make_quote(symbol: &str, price: f64, change: f64) -> Result<Quote, TrackfolioError> {
    if !price.is_finite() || price <= 0.0 || !change.is_finite() {
        return Err(TrackfolioError::Generation(format!(
            "{} produced price {} change {}",
            symbol, price, change
        )));
    }

    Ok(Quote {
        symbol: symbol.to_string(),
        price: round2(price),
        change: round2(change),
        change_percent: round2(change / price * 100.0),
    })
}
