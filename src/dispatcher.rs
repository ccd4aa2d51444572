//! Command dispatcher that routes parsed CLI commands to their handlers.
//!
//! Every handler receives the [`Session`] resolved in `main`, so the active
//! user, configuration and output mode are explicit arguments.

mod holdings;
mod market;
mod portfolio;

use anyhow::Result;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::cli::Commands;
use trackfolio::db::Holding;
use trackfolio::market::{FeedSettings, FeedSnapshot, MarketFeed, QuoteMap};
use trackfolio::session::Session;

/// Route a parsed command to its handler
pub async fn dispatch_command(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Holdings { action } => holdings::dispatch_holdings(action, session).await,
        Commands::Portfolio { action } => portfolio::dispatch_portfolio(action, session).await,
        Commands::Market { action } => market::dispatch_market(action, session).await,
    }
}

/// Simulate one round of quotes for the symbols the holdings reference.
///
/// Symbols without a simulation profile are left unquoted and therefore
/// excluded from every total.
pub(crate) async fn quotes_for_holdings(session: &Session, holdings: &[Holding]) -> Result<QuoteMap> {
    let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).unique().collect();
    if symbols.is_empty() {
        return Ok(QuoteMap::new());
    }

    let profiles = session.config.profiles();
    let unknown = symbols.iter().filter(|s| !profiles.contains_key(*s)).join(", ");
    if !unknown.is_empty() {
        warn!("No simulated quotes for: {}", unknown);
    }

    let feed = session.market_feed(symbols);
    let quotes = feed.refresh().await;
    debug!("Valuing holdings with {} quotes", quotes.len());
    Ok(QuoteMap::clone(&quotes))
}

/// Start `feed` and hand every published snapshot to `render`.
///
/// Runs until Ctrl+C or until `ticks` snapshots have been rendered. The
/// loading placeholder published before the first tick is skipped.
pub(crate) async fn follow_feed<F>(
    mut feed: MarketFeed,
    settings: &FeedSettings,
    ticks: Option<u64>,
    mut render: F,
) -> Result<()>
where
    F: FnMut(&FeedSnapshot) -> Result<()>,
{
    let mut rx = feed.subscribe();
    feed.start(settings);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen = 0u64;
    while !ticks.is_some_and(|limit| seen >= limit) {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Quote feed closed");
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.loading {
                    continue;
                }
                render(&snapshot)?;
                seen += 1;
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break;
            }
        }
    }

    feed.shutdown();
    Ok(())
}
