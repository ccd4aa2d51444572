use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ImportReport;
use crate::db::{Category, Holding};

/// One CSV line, same column names as the JSON keys
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    category: Category,
    amount: f64,
    average_cost: f64,
    #[serde(default)]
    purchase_date: Option<NaiveDate>,
}

impl From<&Holding> for CsvRow {
    fn from(h: &Holding) -> Self {
        Self {
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            category: h.category,
            amount: h.quantity,
            average_cost: h.average_cost,
            purchase_date: h.purchase_date,
        }
    }
}

impl From<CsvRow> for Holding {
    fn from(row: CsvRow) -> Self {
        let holding = Holding::new(
            &row.symbol,
            &row.name,
            row.category,
            row.amount,
            row.average_cost,
        );
        match row.purchase_date {
            Some(date) => holding.with_purchase_date(date),
            None => holding,
        }
    }
}

/// CSV with a header row: `symbol,name,type,amount,averageCost,purchaseDate`
pub fn export_csv(holdings: &[Holding]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for holding in holdings {
        writer.serialize(CsvRow::from(holding))?;
    }
    if holdings.is_empty() {
        writer.write_record([
            "symbol",
            "name",
            "type",
            "amount",
            "averageCost",
            "purchaseDate",
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Parse holdings from CSV produced by [`export_csv`]; bad rows are reported
/// with their zero-based data row index.
pub fn parse_holdings_csv(content: &str) -> Result<ImportReport> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mut report = ImportReport::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => report.accept(index, row.into()),
            Err(e) => {
                warn!("Skipping row {}: {}", index + 2, e);
                report.reject(index, e.to_string());
            }
        }
    }

    Ok(report)
}
