//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use trackfolio::db::{Category, Holding};
use trackfolio::importers::ImportReport;
use trackfolio::market::QuoteMap;
use trackfolio::reports::{
    allocation_breakdown, AggregateSnapshot, ComparisonPoint, PerformancePoint, PositionValuation,
    RebalanceAction, TimeRange, TradeSide,
};
use trackfolio::utils::{format_currency, format_percent, round2};

/// Pretty JSON for any serializable report
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn signed_currency(value: f64) -> ColoredString {
    if value >= 0.0 {
        format_currency(value).green()
    } else {
        format_currency(value).red()
    }
}

fn signed_percent(value: f64) -> ColoredString {
    if value >= 0.0 {
        format_percent(value).green()
    } else {
        format_percent(value).red()
    }
}

fn format_quantity(quantity: f64) -> String {
    // Crypto holdings are commonly fractional
    if quantity.fract() == 0.0 {
        format!("{:.0}", quantity)
    } else {
        format!("{}", quantity)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPortfolio<'a> {
    #[serde(flatten)]
    snapshot: &'a AggregateSnapshot,
    positions: &'a [PositionValuation],
}

/// Portfolio summary and positions for `--json`
pub fn format_portfolio_json(
    snapshot: &AggregateSnapshot,
    positions: &[PositionValuation],
) -> anyhow::Result<String> {
    to_json(&JsonPortfolio {
        snapshot,
        positions,
    })
}

/// Same document as [`format_portfolio_json`] on a single line, for streaming
pub fn format_portfolio_json_line(
    snapshot: &AggregateSnapshot,
    positions: &[PositionValuation],
) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&JsonPortfolio {
        snapshot,
        positions,
    })?)
}

/// Totals, performers and allocation
pub fn format_portfolio_summary(snapshot: &AggregateSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{} Portfolio Summary\n", "📊".cyan().bold()));
    output.push_str(&format!("{}", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Value:".bold(),
        format_currency(snapshot.total_value)
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Cost:".bold(),
        format_currency(snapshot.total_cost)
    ));
    output.push_str(&format!(
        "\n{:<20} {} ({})",
        "Total Gain:".bold(),
        signed_currency(snapshot.total_gain),
        signed_percent(snapshot.gain_percentage)
    ));

    if let Some(best) = &snapshot.best_performer {
        output.push_str(&format!(
            "\n{:<20} {} {}",
            "Best Performer:".bold(),
            best.symbol,
            signed_percent(best.gain_percent)
        ));
    }
    if let Some(worst) = &snapshot.worst_performer {
        output.push_str(&format!(
            "\n{:<20} {} {}",
            "Worst Performer:".bold(),
            worst.symbol,
            signed_percent(worst.gain_percent)
        ));
    }

    let slices = allocation_breakdown(snapshot);
    if !slices.is_empty() {
        #[derive(Tabled)]
        struct AllocationRow {
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Value")]
            value: String,
            #[tabled(rename = "Share")]
            share: String,
        }

        let rows: Vec<AllocationRow> = slices
            .iter()
            .map(|slice| AllocationRow {
                category: slice.category.to_string(),
                value: format_currency(slice.value),
                share: format!("{:.1}%", slice.percent),
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        table.modify(Columns::new(1..), Alignment::right());

        output.push_str(&format!("\n\n{} Allocation\n", "🧩".cyan().bold()));
        output.push_str(&table.to_string());
    }

    output.push('\n');
    output
}

/// Per-holding valuation table
pub fn format_positions_table(positions: &[PositionValuation]) -> String {
    #[derive(Tabled)]
    struct PositionRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Type")]
        category: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Avg Cost")]
        avg_cost: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Gain")]
        gain: String,
        #[tabled(rename = "Return %")]
        return_pct: String,
    }

    let na = || "N/A".to_string();

    let rows: Vec<PositionRow> = positions
        .iter()
        .map(|p| PositionRow {
            id: p.holding.id.map(|id| id.to_string()).unwrap_or_default(),
            symbol: p.holding.symbol.clone(),
            category: p.holding.category.to_string(),
            quantity: format_quantity(p.holding.quantity),
            avg_cost: format_currency(p.holding.average_cost),
            price: p.price.map(format_currency).unwrap_or_else(na),
            day: p
                .change_percent
                .map(|c| signed_percent(c).to_string())
                .unwrap_or_else(na),
            value: p.current_value.map(format_currency).unwrap_or_else(na),
            gain: p
                .gain
                .map(|g| signed_currency(g).to_string())
                .unwrap_or_else(na),
            return_pct: p
                .gain_percent
                .map(|g| signed_percent(g).to_string())
                .unwrap_or_else(na),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    // Right-align everything after ID, Symbol and Type
    table.modify(Columns::new(3..), Alignment::right());

    format!("\n{} Positions\n{}\n", "📈".cyan().bold(), table)
}

#[derive(Tabled)]
struct HoldingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Avg Cost")]
    avg_cost: String,
    #[tabled(rename = "Cost Basis")]
    cost_basis: String,
    #[tabled(rename = "Purchased")]
    purchased: String,
}

impl From<&Holding> for HoldingRow {
    fn from(h: &Holding) -> Self {
        Self {
            id: h.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            category: h.category.to_string(),
            quantity: format_quantity(h.quantity),
            avg_cost: format_currency(h.average_cost),
            cost_basis: format_currency(h.cost_basis()),
            purchased: h
                .purchase_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Plain holdings table (no market data)
pub fn format_holdings_table(holdings: &[Holding]) -> String {
    let rows: Vec<HoldingRow> = holdings.iter().map(HoldingRow::from).collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(4..7), Alignment::right());
    table.to_string()
}

/// One table per category, in category order
pub fn format_grouped_holdings(groups: &BTreeMap<Category, Vec<Holding>>) -> String {
    groups
        .iter()
        .map(|(category, holdings)| {
            format!(
                "{} ({})\n{}",
                category.to_string().bold(),
                holdings.len(),
                format_holdings_table(holdings)
            )
        })
        .join("\n\n")
}

/// Quote board with coloured daily change
pub fn format_quotes_table(quotes: &QuoteMap, last_updated: Option<DateTime<Utc>>) -> String {
    #[derive(Tabled)]
    struct QuoteRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Change")]
        change: String,
        #[tabled(rename = "Change %")]
        change_pct: String,
    }

    let rows: Vec<QuoteRow> = quotes
        .values()
        .map(|q| QuoteRow {
            symbol: q.symbol.clone(),
            price: format_currency(q.price),
            change: signed_currency(q.change).to_string(),
            change_pct: signed_percent(q.change_percent).to_string(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    let mut output = table.to_string();
    if let Some(ts) = last_updated {
        output.push_str(&format!(
            "\n{}",
            format!("Last updated {}", ts.format("%Y-%m-%d %H:%M:%S UTC")).bright_black()
        ));
    }
    output
}

/// Suggested trades
pub fn format_rebalance_table(actions: &[RebalanceAction]) -> String {
    if actions.is_empty() {
        return format!(
            "{} Portfolio is already balanced (no trade above $1.00)\n",
            "✓".green().bold()
        );
    }

    #[derive(Tabled)]
    struct ActionRow {
        #[tabled(rename = "Action")]
        side: String,
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Units")]
        units: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Current %")]
        current: String,
        #[tabled(rename = "Target %")]
        target: String,
    }

    let rows: Vec<ActionRow> = actions
        .iter()
        .map(|a| ActionRow {
            side: match a.side {
                TradeSide::Buy => a.side.to_string().green().to_string(),
                TradeSide::Sell => a.side.to_string().red().to_string(),
            },
            symbol: a.symbol.clone(),
            units: format!("{:.4}", a.units),
            value: format_currency(a.value),
            current: format!("{:.2}%", round2(a.current_percent)),
            target: format!("{:.2}%", round2(a.target_percent)),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..), Alignment::right());

    format!("\n{} Rebalancing Suggestions\n{}\n", "⚖".cyan().bold(), table)
}

/// Daily value history with change vs the first day
pub fn format_performance_table(points: &[PerformancePoint], range: TimeRange) -> String {
    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<PointRow> = points
        .iter()
        .map(|p| PointRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            value: format_currency(p.value),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    let mut output = format!(
        "\n{} Simulated Performance ({})\n{}",
        "📉".cyan().bold(),
        range,
        table
    );

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if first.value > 0.0 {
            let change = (last.value - first.value) / first.value * 100.0;
            output.push_str(&format!(
                "\n{:<20} {}",
                "Period Change:".bold(),
                signed_percent(change)
            ));
        }
    }
    output.push('\n');
    output
}

/// One column per compared symbol, plus the change over the range
pub fn format_comparison_table(points: &[ComparisonPoint], range: TimeRange) -> String {
    let symbols: Vec<&String> = points
        .first()
        .map(|p| p.values.keys().collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    let mut header = vec!["Date".to_string()];
    header.extend(symbols.iter().map(|s| s.to_string()));
    builder.push_record(header);

    for point in points {
        let mut row = vec![point.date.format("%Y-%m-%d").to_string()];
        row.extend(symbols.iter().map(|s| match point.values.get(*s) {
            Some(value) => format_currency(*value),
            None => "N/A".to_string(),
        }));
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    let mut output = format!(
        "\n{} Performance Comparison ({})\n{}\n",
        "📊".cyan().bold(),
        range,
        table
    );

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        for symbol in &symbols {
            let (Some(start), Some(end)) = (first.values.get(*symbol), last.values.get(*symbol))
            else {
                continue;
            };
            if *start > 0.0 {
                output.push_str(&format!(
                    "{:<20} {}\n",
                    format!("{}:", symbol).bold(),
                    signed_percent((end - start) / start * 100.0)
                ));
            }
        }
    }
    output
}

/// Summary of an import run
pub fn format_import_report(report: &ImportReport, dry_run: bool) -> String {
    let mut output = String::new();

    if !report.holdings.is_empty() {
        output.push_str(&format_holdings_table(&report.holdings));
        output.push('\n');
    }

    for issue in &report.issues {
        output.push_str(&format!(
            "{} entry {}: {}\n",
            "⚠".yellow().bold(),
            issue.index,
            issue.reason
        ));
    }

    let verb = if dry_run { "Would import" } else { "Imported" };
    output.push_str(&format!(
        "{} {} {} holding(s), skipped {}\n",
        "✓".green().bold(),
        verb,
        report.holdings.len(),
        report.issues.len()
    ));
    if dry_run {
        output.push_str(&format!("{}\n", "(dry run - nothing saved)".yellow()));
    }
    output
}

/// Format empty portfolio message
pub fn format_empty_portfolio() -> String {
    format!(
        "{} No holdings found\nAdd one using: {} holdings add <SYMBOL> --quantity <N> --cost <PRICE>\n",
        "ℹ".blue().bold(),
        "trackfolio".bold()
    )
}
