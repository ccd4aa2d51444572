//! Application configuration
//!
//! Settings are read from a TOML file. Resolution order for the file:
//! `--config <path>`, then `$TRACKFOLIO_CONFIG`, then
//! `<config dir>/trackfolio/config.toml`. A missing default file simply
//! yields the built-in defaults.
//!
//! ```toml
//! [market]
//! main_interval_secs = 30
//! watchlist_interval_secs = 10
//! watchlist = ["AAPL", "BTC"]
//!
//! [[market.symbols]]
//! symbol = "NVDA"
//! base_price = 450.0
//! volatility = 12.0
//!
//! [storage]
//! db_path = "/tmp/trackfolio.db"
//!
//! [session]
//! user = "alice"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::db::normalize_symbol;
use crate::error::TrackfolioError;
use crate::market::{default_profiles, FeedSettings, SymbolProfile, DEFAULT_WATCHLIST};

pub const CONFIG_ENV_VAR: &str = "TRACKFOLIO_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub main_interval_secs: u64,
    pub watchlist_interval_secs: u64,
    pub watchlist: Vec<String>,
    /// Extra or overriding simulation profiles
    pub symbols: Vec<SymbolProfileConfig>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            main_interval_secs: 30,
            watchlist_interval_secs: 10,
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            symbols: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolProfileConfig {
    pub symbol: String,
    pub base_price: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user: Option<String>,
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file exists at
    /// the default location. An explicitly requested file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);

        let (path, required) = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(p) => (p, true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            if required {
                return Err(TrackfolioError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                ))
                .into());
            }
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| TrackfolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TrackfolioError> {
        if self.market.main_interval_secs == 0 || self.market.watchlist_interval_secs == 0 {
            return Err(TrackfolioError::Config(
                "market intervals must be at least 1 second".to_string(),
            ));
        }

        for entry in &self.market.symbols {
            let profile = SymbolProfile::new(entry.base_price, entry.volatility);
            if entry.symbol.trim().is_empty() || !profile.is_valid() {
                return Err(TrackfolioError::Config(format!(
                    "invalid simulation profile for '{}': base price must exceed volatility",
                    entry.symbol
                )));
            }
        }

        Ok(())
    }

    /// Built-in profiles merged with the configured ones (config wins)
    pub fn profiles(&self) -> HashMap<String, SymbolProfile> {
        let mut profiles = default_profiles();
        for entry in &self.market.symbols {
            profiles.insert(
                normalize_symbol(&entry.symbol),
                SymbolProfile::new(entry.base_price, entry.volatility),
            );
        }
        profiles
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            main_interval: Duration::from_secs(self.market.main_interval_secs),
            watchlist_interval: Duration::from_secs(self.market.watchlist_interval_secs),
            watchlist: self
                .market
                .watchlist
                .iter()
                .map(|s| normalize_symbol(s))
                .collect(),
        }
    }
}

/// `<config dir>/trackfolio/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("trackfolio").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.market.main_interval_secs, 30);
        assert_eq!(config.market.watchlist.len(), 5);
    }

    #[test]
    fn test_profiles_merge_with_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [market]
            watchlist = ["nvda"]

            [[market.symbols]]
            symbol = "nvda"
            base_price = 450.0
            volatility = 12.0

            [[market.symbols]]
            symbol = "AAPL"
            base_price = 190.0
            volatility = 3.0
            "#,
        )
        .unwrap();

        let profiles = config.profiles();
        assert_eq!(profiles["NVDA"], SymbolProfile::new(450.0, 12.0));
        assert_eq!(profiles["AAPL"], SymbolProfile::new(190.0, 3.0));
        assert!(profiles.contains_key("BTC"));
        assert_eq!(config.feed_settings().watchlist, vec!["NVDA".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_toml("[market]\nmain_interval_secs = 0").is_err());
        assert!(AppConfig::from_toml(
            "[[market.symbols]]\nsymbol = \"X\"\nbase_price = 1.0\nvolatility = 2.0"
        )
        .is_err());
        assert!(AppConfig::from_toml("[market]\nwatchlist = 3").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nuser = \"alice\"\n[storage]\ndb_path = \"/tmp/x.db\"\n")
            .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.session.user.as_deref(), Some("alice"));
        assert_eq!(config.storage.db_path, Some(PathBuf::from("/tmp/x.db")));

        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
