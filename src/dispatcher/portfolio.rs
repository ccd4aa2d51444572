use anyhow::{anyhow, Result};
use chrono::Local;
use colored::Colorize;
use itertools::Itertools;
use tracing::{info, warn};

use super::{follow_feed, quotes_for_holdings};
use crate::cli::{formatters, PortfolioCommands};
use trackfolio::db::{self, normalize_symbol, Holding};
use trackfolio::reports::{self, Benchmark, TimeRange};
use trackfolio::session::Session;

// Top-level dispatcher for portfolio sub-commands
pub async fn dispatch_portfolio(action: PortfolioCommands, session: &Session) -> Result<()> {
    match action {
        PortfolioCommands::Show => dispatch_portfolio_show(session).await,
        PortfolioCommands::Performance { range } => {
            dispatch_performance(range.parse()?, session).await
        }
        PortfolioCommands::Rebalance { targets } => {
            let targets = parse_targets(&targets)?;
            dispatch_rebalance(&targets, session).await
        }
        PortfolioCommands::Watch { ticks } => dispatch_portfolio_watch(ticks, session).await,
        PortfolioCommands::Compare {
            benchmarks,
            symbols,
            range,
        } => {
            let benchmarks = benchmarks
                .iter()
                .map(|b| b.parse::<Benchmark>())
                .collect::<Result<Vec<_>, _>>()?;
            dispatch_compare(&benchmarks, &symbols, range.parse()?, session).await
        }
    }
}

pub async fn dispatch_portfolio_show(session: &Session) -> Result<()> {
    info!("Generating portfolio report for {}", session.user_id);

    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;

    if holdings.is_empty() && !session.json_output {
        println!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    let quotes = quotes_for_holdings(session, &holdings).await?;
    let snapshot = reports::aggregate(&holdings, &quotes);
    let positions = reports::value_positions(&holdings, &quotes);

    if session.json_output {
        println!("{}", formatters::format_portfolio_json(&snapshot, &positions)?);
    } else {
        print!("{}", formatters::format_portfolio_summary(&snapshot));
        print!("{}", formatters::format_positions_table(&positions));
    }
    Ok(())
}

/// Re-aggregate and re-print the portfolio on every quote update
async fn dispatch_portfolio_watch(ticks: Option<u64>, session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;

    if holdings.is_empty() && !session.json_output {
        println!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).unique().collect();
    let mut settings = session.config.feed_settings();
    settings.watchlist.retain(|s| symbols.contains(s));

    let feed = session.market_feed(symbols);
    info!(
        "Watching portfolio of {} holdings for {}",
        holdings.len(),
        session.user_id
    );
    if !session.json_output {
        println!("{}", "Press Ctrl+C to stop".bright_black());
    }

    follow_feed(feed, &settings, ticks, |update| {
        let snapshot = reports::aggregate(&holdings, &update.quotes);
        let positions = reports::value_positions(&holdings, &update.quotes);

        if session.json_output {
            println!("{}", formatters::format_portfolio_json_line(&snapshot, &positions)?);
        } else {
            print!("{}", formatters::format_portfolio_summary(&snapshot));
            print!("{}", formatters::format_positions_table(&positions));
            if let Some(ts) = update.last_updated {
                println!(
                    "{}",
                    format!("Last updated {}", ts.format("%Y-%m-%d %H:%M:%S UTC")).bright_black()
                );
            }
        }
        Ok(())
    })
    .await
}

async fn dispatch_performance(range: TimeRange, session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;

    if holdings.is_empty() && !session.json_output {
        println!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    let quotes = quotes_for_holdings(session, &holdings).await?;
    let today = Local::now().date_naive();
    let series =
        reports::performance_series(&holdings, &quotes, range, today, &mut rand::rng());

    if session.json_output {
        println!("{}", formatters::to_json(&series)?);
    } else {
        print!("{}", formatters::format_performance_table(&series, range));
    }
    Ok(())
}

async fn dispatch_compare(
    benchmarks: &[Benchmark],
    requested: &[String],
    range: TimeRange,
    session: &Session,
) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;
    let selected = select_holdings(&holdings, requested);

    if selected.is_empty() && benchmarks.is_empty() {
        return Err(anyhow!("Nothing to compare: select a holding or a benchmark"));
    }

    let today = Local::now().date_naive();
    let series =
        reports::comparison_series(&selected, benchmarks, range, today, &mut rand::rng());

    if session.json_output {
        println!("{}", formatters::to_json(&series)?);
    } else {
        print!("{}", formatters::format_comparison_table(&series, range));
    }
    Ok(())
}

/// Holdings matching the requested symbols, or all of them when none are named
fn select_holdings(holdings: &[Holding], requested: &[String]) -> Vec<Holding> {
    if requested.is_empty() {
        return holdings.to_vec();
    }

    let wanted: Vec<String> = requested.iter().map(|s| normalize_symbol(s)).collect();
    for symbol in wanted.iter().filter(|s| !holdings.iter().any(|h| &h.symbol == *s)) {
        warn!("{} is not in the portfolio, skipping", symbol);
    }
    holdings
        .iter()
        .filter(|h| wanted.contains(&h.symbol))
        .cloned()
        .collect()
}

async fn dispatch_rebalance(targets: &[(String, f64)], session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;

    if holdings.is_empty() && !session.json_output {
        println!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    let mut quotes = quotes_for_holdings(session, &holdings).await?;

    // Targets may name symbols not held yet; quote them too so units are priced
    let extra: Vec<&str> = targets
        .iter()
        .map(|(s, _)| s.as_str())
        .filter(|s| !quotes.contains_key(*s))
        .collect();
    if !extra.is_empty() {
        let feed = session.market_feed(extra.iter().copied());
        quotes.extend(
            feed.refresh()
                .await
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    let actions = reports::suggest_rebalance(&holdings, &quotes, targets);

    if session.json_output {
        println!("{}", formatters::to_json(&actions)?);
    } else {
        print!("{}", formatters::format_rebalance_table(&actions));
    }
    Ok(())
}

/// Parse `SYMBOL=PERCENT` pairs
fn parse_targets(raw: &[String]) -> Result<Vec<(String, f64)>> {
    let targets = raw
        .iter()
        .map(|entry| {
            let (symbol, pct) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid target '{}': expected SYMBOL=PERCENT", entry))?;
            let pct: f64 = pct
                .trim()
                .trim_end_matches('%')
                .parse()
                .map_err(|_| anyhow!("Invalid percentage in target '{}'", entry))?;
            if !(0.0..=100.0).contains(&pct) {
                return Err(anyhow!("Target for {} must be between 0 and 100", symbol.trim()));
            }
            Ok((normalize_symbol(symbol), pct))
        })
        .collect::<Result<Vec<_>>>()?;

    let total: f64 = targets.iter().map(|(_, pct)| pct).sum();
    if total > 100.0 {
        warn!("Targets add up to {:.2}%, other holdings will be sold down", total);
    }
    Ok(targets)
}
