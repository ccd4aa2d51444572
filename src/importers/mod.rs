// Import module - portfolio JSON import and JSON/CSV export

pub mod csv_file;
pub mod json;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use crate::db::Holding;

pub use csv_file::{export_csv, parse_holdings_csv};
pub use json::{export_json, parse_holdings_json};

/// An entry that could not be turned into a holding
#[derive(Debug, Clone, PartialEq)]
pub struct ImportIssue {
    /// Zero-based position in the source file
    pub index: usize,
    pub reason: String,
}

/// Holdings parsed from a file plus the entries that were skipped
#[derive(Debug, Default)]
pub struct ImportReport {
    pub holdings: Vec<Holding>,
    pub issues: Vec<ImportIssue>,
}

impl ImportReport {
    pub(crate) fn accept(&mut self, index: usize, mut holding: Holding) {
        holding.id = None;
        holding.symbol = crate::db::normalize_symbol(&holding.symbol);
        holding.name = holding.name.trim().to_string();

        match holding.validate() {
            Ok(()) => self.holdings.push(holding),
            Err(e) => self.reject(index, e.to_string()),
        }
    }

    pub(crate) fn reject(&mut self, index: usize, reason: impl Into<String>) {
        self.issues.push(ImportIssue {
            index,
            reason: reason.into(),
        });
    }
}

/// Export format for `holdings export`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Render holdings in the requested format
pub fn export_holdings(holdings: &[Holding], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(holdings),
        ExportFormat::Csv => export_csv(holdings),
    }
}

/// `portfolio-assets-YYYY-MM-DD.<ext>`
pub fn default_export_filename(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "portfolio-assets-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Import holdings from a JSON or CSV file, chosen by extension
pub fn import_file<P: AsRef<Path>>(file_path: P) -> Result<ImportReport> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension"))?
        .to_lowercase();

    info!("Importing holdings file: {:?} (type: {})", path, extension);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let report = match extension.as_str() {
        "json" => parse_holdings_json(&content)?,
        "csv" => parse_holdings_csv(&content)?,
        _ => {
            return Err(anyhow!(
                "Unsupported file format: {}. Use .json or .csv",
                extension
            ))
        }
    };

    info!(
        "Parsed {} holdings ({} skipped)",
        report.holdings.len(),
        report.issues.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(
            default_export_filename(date, ExportFormat::Json),
            "portfolio-assets-2024-02-09.json"
        );
        assert_eq!(
            default_export_filename(date, ExportFormat::Csv),
            "portfolio-assets-2024-02-09.csv"
        );
    }

    #[test]
    fn test_import_file_by_extension() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"symbol": "eth", "name": "Ethereum", "type": "Crypto", "amount": 2, "averageCost": 1500}}]"#
        )
        .unwrap();

        let report = import_file(file.path()).unwrap();
        assert_eq!(report.holdings.len(), 1);
        assert_eq!(report.holdings[0].symbol, "ETH");
        assert_eq!(report.holdings[0].category, Category::Crypto);
    }

    #[test]
    fn test_import_file_rejects_unknown_extension() {
        let file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = import_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }
}
