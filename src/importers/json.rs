//! Portfolio JSON files
//!
//! The format is a top-level array of holding objects using the keys
//! `symbol`, `name`, `type`, `amount`, `averageCost` and optionally
//! `purchaseDate`. Any `id` key is ignored on import and never exported.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use super::ImportReport;
use crate::db::Holding;
use crate::error::TrackfolioError;

/// Parse a portfolio JSON document.
///
/// Fails only when the document is not valid JSON or not an array. Entries
/// that are not valid holdings are collected in the report's issues.
pub fn parse_holdings_json(content: &str) -> Result<ImportReport> {
    let document: Value = serde_json::from_str(content).context("Invalid JSON")?;

    let Value::Array(entries) = document else {
        return Err(TrackfolioError::Import(
            "invalid file format: expected an array of holdings".to_string(),
        )
        .into());
    };

    let mut report = ImportReport::default();

    for (index, mut entry) in entries.into_iter().enumerate() {
        // Exported ids may be strings from other stores
        if let Some(object) = entry.as_object_mut() {
            object.remove("id");
        }

        match serde_json::from_value::<Holding>(entry) {
            Ok(holding) => report.accept(index, holding),
            Err(e) => {
                warn!("Skipping entry {}: {}", index, e);
                report.reject(index, e.to_string());
            }
        }
    }

    debug!(
        "JSON import: {} accepted, {} rejected",
        report.holdings.len(),
        report.issues.len()
    );
    Ok(report)
}

/// Pretty-printed JSON array without store ids
pub fn export_json(holdings: &[Holding]) -> Result<String> {
    let exported: Vec<Holding> = holdings
        .iter()
        .cloned()
        .map(|mut h| {
            h.id = None;
            h
        })
        .collect();

    Ok(serde_json::to_string_pretty(&exported)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;

    #[test]
    fn test_non_array_is_rejected() {
        let err = parse_holdings_json(r#"{"symbol": "AAPL"}"#).unwrap_err();
        let import_err = err.downcast_ref::<TrackfolioError>().unwrap();
        assert!(matches!(import_err, TrackfolioError::Import(_)));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_holdings_json("[{").is_err());
    }

    #[test]
    fn test_invalid_entries_are_reported_by_index() {
        let content = r#"[
            {"id": "abc123", "symbol": "aapl", "name": "Apple", "type": "Stock", "amount": 10, "averageCost": 150},
            {"symbol": "BAD", "type": "Spaceship", "amount": 1, "averageCost": 1},
            {"symbol": "NEG", "type": "Bond", "amount": -3, "averageCost": 90},
            "not an object",
            {"symbol": "SPY", "name": "S&P 500", "type": "ETF", "amount": 4, "averageCost": 400, "purchaseDate": "2023-05-02"}
        ]"#;

        let report = parse_holdings_json(content).unwrap();

        let symbols: Vec<_> = report.holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "SPY"]);
        assert_eq!(report.holdings[0].id, None);
        assert_eq!(report.holdings[1].category, Category::Etf);
        assert!(report.holdings[1].purchase_date.is_some());

        let rejected: Vec<_> = report.issues.iter().map(|i| i.index).collect();
        assert_eq!(rejected, vec![1, 2, 3]);
    }

    #[test]
    fn test_export_then_import_keeps_holdings() {
        let mut holding = Holding::new("BTC", "Bitcoin", Category::Crypto, 0.5, 30000.0);
        holding.id = Some(7);

        let json = export_json(&[holding.clone()]).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"averageCost\": 30000.0"));

        let report = parse_holdings_json(&json).unwrap();
        holding.id = None;
        assert_eq!(report.holdings, vec![holding]);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_empty_array() {
        let report = parse_holdings_json("[]").unwrap();
        assert!(report.holdings.is_empty());
        assert_eq!(export_json(&[]).unwrap(), "[]");
    }
}
