use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use super::follow_feed;
use crate::cli::{formatters, MarketCommands};
use trackfolio::db::normalize_symbol;
use trackfolio::market::{FeedSnapshot, Quote, MARKET_OVERVIEW};
use trackfolio::session::Session;

pub async fn dispatch_market(action: MarketCommands, session: &Session) -> Result<()> {
    match action {
        MarketCommands::Quotes { symbols } => dispatch_quotes(&symbols, session).await,
        MarketCommands::Watch { ticks, symbols } => dispatch_watch(ticks, &symbols, session).await,
    }
}

/// Requested symbols (normalized), warning about the ones that cannot be simulated
fn resolve_symbols(requested: &[String], fallback: Vec<String>, session: &Session) -> Vec<String> {
    let symbols: Vec<String> = if requested.is_empty() {
        fallback
    } else {
        requested.iter().map(|s| normalize_symbol(s)).collect()
    };

    let profiles = session.config.profiles();
    for symbol in symbols.iter().filter(|s| !profiles.contains_key(*s)) {
        warn!("No simulation profile for {}, skipping", symbol);
    }
    symbols
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonQuotes<'a> {
    last_updated: Option<chrono::DateTime<chrono::Utc>>,
    quotes: Vec<&'a Quote>,
}

impl<'a> From<&'a FeedSnapshot> for JsonQuotes<'a> {
    fn from(snapshot: &'a FeedSnapshot) -> Self {
        Self {
            last_updated: snapshot.last_updated,
            quotes: snapshot.quotes.values().collect(),
        }
    }
}

async fn dispatch_quotes(requested: &[String], session: &Session) -> Result<()> {
    let fallback = MARKET_OVERVIEW.iter().map(|s| s.to_string()).collect();
    let symbols = resolve_symbols(requested, fallback, session);

    let feed = session.market_feed(symbols);
    feed.refresh().await;
    let snapshot = feed.snapshot();

    if session.json_output {
        println!("{}", formatters::to_json(&JsonQuotes::from(&snapshot))?);
    } else if snapshot.quotes.is_empty() {
        println!("{} No quotes available for the requested symbols", "ℹ".blue().bold());
    } else {
        println!(
            "{}",
            formatters::format_quotes_table(&snapshot.quotes, snapshot.last_updated)
        );
    }
    Ok(())
}

async fn dispatch_watch(ticks: Option<u64>, requested: &[String], session: &Session) -> Result<()> {
    let mut settings = session.config.feed_settings();
    let symbols = resolve_symbols(requested, settings.watchlist.clone(), session);
    settings.watchlist.retain(|s| symbols.contains(s));

    let feed = session.market_feed(symbols);
    info!(
        "Watching {} symbols (refresh every {:?}, watchlist every {:?})",
        feed.symbols().len(),
        settings.main_interval,
        settings.watchlist_interval
    );
    if !session.json_output {
        println!("{}", "Press Ctrl+C to stop".bright_black());
    }

    follow_feed(feed, &settings, ticks, |snapshot| {
        if session.json_output {
            println!("{}", serde_json::to_string(&JsonQuotes::from(snapshot))?);
        } else {
            println!(
                "\n{}",
                formatters::format_quotes_table(&snapshot.quotes, snapshot.last_updated)
            );
        }
        Ok(())
    })
    .await
}
