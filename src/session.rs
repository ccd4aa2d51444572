//! Per-invocation context handed to every command handler.
//!
//! Holds the current user and loaded configuration. Handlers receive it
//! explicitly instead of looking up global state.

use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::debug;

use crate::config::AppConfig;
use crate::db;
use crate::market::{MarketFeed, MarketSimulator};

pub const USER_ENV_VAR: &str = "TRACKFOLIO_USER";
pub const DEFAULT_USER: &str = "local";

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub config: AppConfig,
    pub json_output: bool,
}

impl Session {
    /// Resolve the active user: explicit flag, then `$TRACKFOLIO_USER`, then
    /// the config file, then `local`.
    pub fn resolve(cli_user: Option<&str>, config: AppConfig, json_output: bool) -> Self {
        let env_user = std::env::var(USER_ENV_VAR).ok();
        let user_id = pick_user(cli_user, env_user.as_deref(), config.session.user.as_deref());

        debug!("Session user: {}", user_id);
        Self {
            user_id,
            config,
            json_output,
        }
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.config.storage.db_path.clone()
    }

    /// Open the holdings store, creating the schema on first use
    pub fn open_store(&self) -> Result<Connection> {
        db::init_database(self.db_path())?;
        db::open_db(self.db_path())
    }

    pub fn simulator(&self) -> MarketSimulator {
        MarketSimulator::new(self.config.profiles())
    }

    /// Quote feed for the given symbols, not yet started
    pub fn market_feed<I, S>(&self, symbols: I) -> MarketFeed
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MarketFeed::new(self.simulator(), symbols)
    }
}

/// First non-blank candidate in priority order, trimmed
fn pick_user(cli: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    [cli, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|u| !u.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}
