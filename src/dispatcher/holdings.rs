use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::quotes_for_holdings;
use crate::cli::{formatters, ExportFormatArg, HoldingsCommands};
use trackfolio::db::{self, normalize_symbol, Category, Holding};
use trackfolio::error::TrackfolioError;
use trackfolio::importers::{self, ExportFormat};
use trackfolio::reports::{group_by_category, HoldingFilter, PerformanceFilter};
use trackfolio::session::Session;

pub async fn dispatch_holdings(action: HoldingsCommands, session: &Session) -> Result<()> {
    match action {
        HoldingsCommands::Add {
            symbol,
            name,
            category,
            quantity,
            cost,
            date,
        } => {
            let mut holding = Holding::new(&symbol, &name, category.parse()?, quantity, cost);
            if let Some(d) = date.as_deref() {
                holding = holding.with_purchase_date(parse_date(d)?);
            }
            dispatch_add(holding, session)
        }
        HoldingsCommands::Edit {
            id,
            symbol,
            name,
            category,
            quantity,
            cost,
            date,
        } => {
            let changes = HoldingChanges {
                symbol,
                name,
                category: category.map(|c| c.parse::<Category>()).transpose()?,
                quantity,
                average_cost: cost,
                purchase_date: date.as_deref().map(parse_date).transpose()?,
            };
            dispatch_edit(id, changes, session)
        }
        HoldingsCommands::Remove { id } => dispatch_remove(id, session),
        HoldingsCommands::List {
            search,
            category,
            performance,
            group,
        } => {
            let filter = HoldingFilter {
                search,
                categories: category
                    .iter()
                    .map(|c| c.parse::<Category>())
                    .collect::<Result<Vec<_>, _>>()?,
                performance: performance
                    .as_deref()
                    .map(str::parse::<PerformanceFilter>)
                    .transpose()?,
            };
            dispatch_list(&filter, group, session).await
        }
        HoldingsCommands::Import { file, dry_run } => dispatch_import(&file, dry_run, session),
        HoldingsCommands::Export {
            output,
            format,
            stdout,
        } => {
            let format = match format {
                ExportFormatArg::Json => ExportFormat::Json,
                ExportFormatArg::Csv => ExportFormat::Csv,
            };
            dispatch_export(output, format, stdout, session)
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Fields to overwrite on an existing holding
#[derive(Debug, Default)]
struct HoldingChanges {
    symbol: Option<String>,
    name: Option<String>,
    category: Option<Category>,
    quantity: Option<f64>,
    average_cost: Option<f64>,
    purchase_date: Option<NaiveDate>,
}

impl HoldingChanges {
    fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.name.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.average_cost.is_none()
            && self.purchase_date.is_none()
    }

    fn apply(self, holding: &mut Holding) {
        if let Some(symbol) = self.symbol {
            holding.symbol = normalize_symbol(&symbol);
        }
        if let Some(name) = self.name {
            holding.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            holding.category = category;
        }
        if let Some(quantity) = self.quantity {
            holding.quantity = quantity;
        }
        if let Some(cost) = self.average_cost {
            holding.average_cost = cost;
        }
        if let Some(date) = self.purchase_date {
            holding.purchase_date = Some(date);
        }
    }
}

fn print_holding(holding: &Holding, message: &str, session: &Session) -> Result<()> {
    if session.json_output {
        println!("{}", formatters::to_json(holding)?);
    } else {
        println!(
            "{} {} #{} {}",
            "✓".green().bold(),
            message,
            holding.id.unwrap_or_default(),
            holding.symbol.bold()
        );
    }
    Ok(())
}

fn dispatch_add(mut holding: Holding, session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let id = db::insert_holding(&conn, &session.user_id, &holding)?;
    holding.id = Some(id);
    print_holding(&holding, "Added holding", session)
}

fn dispatch_edit(id: i64, changes: HoldingChanges, session: &Session) -> Result<()> {
    if changes.is_empty() {
        anyhow::bail!("Nothing to change. Pass at least one field (e.g. --quantity 5)");
    }

    let conn = session.open_store()?;
    let mut holding = db::get_holding(&conn, &session.user_id, id)?
        .ok_or(TrackfolioError::HoldingNotFound(id))?;

    changes.apply(&mut holding);
    db::update_holding(&conn, &session.user_id, &holding)?;
    print_holding(&holding, "Updated holding", session)
}

fn dispatch_remove(id: i64, session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let holding = db::get_holding(&conn, &session.user_id, id)?
        .ok_or(TrackfolioError::HoldingNotFound(id))?;

    db::delete_holding(&conn, &session.user_id, id)?;
    print_holding(&holding, "Removed holding", session)
}

async fn dispatch_list(filter: &HoldingFilter, group: bool, session: &Session) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;

    let holdings = if filter.is_empty() {
        holdings
    } else {
        let quotes = if filter.performance.is_some() {
            quotes_for_holdings(session, &holdings).await?
        } else {
            Default::default()
        };
        filter.apply(&holdings, &quotes)
    };

    if session.json_output {
        if group {
            println!("{}", formatters::to_json(&group_by_category(&holdings))?);
        } else {
            println!("{}", formatters::to_json(&holdings)?);
        }
        return Ok(());
    }

    if holdings.is_empty() {
        if filter.is_empty() {
            println!("{}", formatters::format_empty_portfolio());
        } else {
            println!("{} No holdings match the given filters", "ℹ".blue().bold());
        }
        return Ok(());
    }

    if group {
        println!("{}", formatters::format_grouped_holdings(&group_by_category(&holdings)));
    } else {
        println!("{}", formatters::format_holdings_table(&holdings));
    }
    Ok(())
}

fn dispatch_import(file: &Path, dry_run: bool, session: &Session) -> Result<()> {
    info!("Importing holdings from {:?} (dry run: {})", file, dry_run);
    let report = importers::import_file(file)?;

    if !dry_run && !report.holdings.is_empty() {
        let mut conn = session.open_store()?;
        let tx = conn.transaction()?;
        for holding in &report.holdings {
            db::insert_holding(&tx, &session.user_id, holding)?;
        }
        tx.commit()?;
        info!("Saved {} imported holdings", report.holdings.len());
    }

    if session.json_output {
        #[derive(serde::Serialize)]
        struct JsonIssue<'a> {
            index: usize,
            reason: &'a str,
        }
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct JsonImport<'a> {
            dry_run: bool,
            imported: &'a [Holding],
            skipped: Vec<JsonIssue<'a>>,
        }

        let skipped = report
            .issues
            .iter()
            .map(|i| JsonIssue {
                index: i.index,
                reason: &i.reason,
            })
            .collect();
        println!(
            "{}",
            formatters::to_json(&JsonImport {
                dry_run,
                imported: &report.holdings,
                skipped,
            })?
        );
    } else {
        print!("{}", formatters::format_import_report(&report, dry_run));
    }
    Ok(())
}

fn dispatch_export(
    output: Option<PathBuf>,
    format: ExportFormat,
    to_stdout: bool,
    session: &Session,
) -> Result<()> {
    let conn = session.open_store()?;
    let holdings = db::list_holdings(&conn, &session.user_id)?;
    let content = importers::export_holdings(&holdings, format)?;

    if to_stdout {
        println!("{}", content);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| {
        PathBuf::from(importers::default_export_filename(
            chrono::Local::now().date_naive(),
            format,
        ))
    });
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Exported {} holdings to {:?}", holdings.len(), path);
    if session.json_output {
        println!(
            "{}",
            serde_json::json!({ "path": path, "count": holdings.len() })
        );
    } else {
        println!(
            "{} Exported {} holding(s) to {}",
            "✓".green().bold(),
            holdings.len(),
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_apply_only_given_fields() {
        let mut holding = Holding::new("AAPL", "Apple", Category::Stock, 10.0, 150.0);
        let changes = HoldingChanges {
            symbol: Some(" msft ".to_string()),
            quantity: Some(4.0),
            ..Default::default()
        };
        assert!(!changes.is_empty());

        changes.apply(&mut holding);

        assert_eq!(holding.symbol, "MSFT");
        assert_eq!(holding.quantity, 4.0);
        assert_eq!(holding.average_cost, 150.0);
        assert_eq!(holding.name, "Apple");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }
}
