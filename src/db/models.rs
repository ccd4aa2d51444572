use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackfolioError;

/// Holding categories supported by the tracker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String", try_from = "String")]
pub enum Category {
    Stock,
    Crypto,
    Etf,
    Bond,
    Commodity,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Stock,
        Category::Crypto,
        Category::Etf,
        Category::Bond,
        Category::Commodity,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stock => "Stock",
            Category::Crypto => "Crypto",
            Category::Etf => "ETF",
            Category::Bond => "Bond",
            Category::Commodity => "Commodity",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TrackfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STOCK" => Ok(Category::Stock),
            "CRYPTO" | "CRYPTOCURRENCY" => Ok(Category::Crypto),
            "ETF" => Ok(Category::Etf),
            "BOND" => Ok(Category::Bond),
            "COMMODITY" => Ok(Category::Commodity),
            "OTHER" => Ok(Category::Other),
            other => Err(TrackfolioError::Validation(format!(
                "unknown category '{}' (use {})",
                other,
                Category::ALL.map(|c| c.as_str()).join(", ")
            ))),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl TryFrom<String> for Category {
    type Error = TrackfolioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A user's position in one instrument.
///
/// Serialized with the field names used by exported portfolio files
/// (`type`, `amount`, `averageCost`, `purchaseDate`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "amount")]
    pub quantity: f64,
    pub average_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
}

impl Holding {
    pub fn new(
        symbol: &str,
        name: &str,
        category: Category,
        quantity: f64,
        average_cost: f64,
    ) -> Self {
        Self {
            id: None,
            symbol: normalize_symbol(symbol),
            name: name.trim().to_string(),
            category,
            quantity,
            average_cost,
            purchase_date: None,
        }
    }

    pub fn with_purchase_date(mut self, date: NaiveDate) -> Self {
        self.purchase_date = Some(date);
        self
    }

    /// Check the invariants the editing surface guarantees before a holding
    /// reaches the store. The aggregator itself never validates.
    pub fn validate(&self) -> Result<(), TrackfolioError> {
        if self.symbol.trim().is_empty() {
            return Err(TrackfolioError::Validation("symbol is required".to_string()));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(TrackfolioError::Validation(format!(
                "{}: quantity must be a non-negative number (got {})",
                self.symbol, self.quantity
            )));
        }
        if !self.average_cost.is_finite() || self.average_cost < 0.0 {
            return Err(TrackfolioError::Validation(format!(
                "{}: average cost must be a non-negative number (got {})",
                self.symbol, self.average_cost
            )));
        }
        Ok(())
    }

    /// quantity × average cost
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.average_cost
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("stock".parse::<Category>().unwrap(), Category::Stock);
        assert_eq!("Cryptocurrency".parse::<Category>().unwrap(), Category::Crypto);
        assert_eq!(" etf ".parse::<Category>().unwrap(), Category::Etf);

        let err = "REIT".parse::<Category>().unwrap_err();
        assert!(err.to_string().contains("Stock, Crypto, ETF, Bond, Commodity, Other"));
    }

    #[test]
    fn test_holding_uses_export_field_names() {
        let holding = Holding::new("aapl", "Apple Inc.", Category::Etf, 10.0, 150.0)
            .with_purchase_date(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        let json = serde_json::to_value(&holding).unwrap();

        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["type"], "ETF");
        assert_eq!(json["amount"], 10.0);
        assert_eq!(json["averageCost"], 150.0);
        assert_eq!(json["purchaseDate"], "2023-03-01");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_holding_deserializes_without_optional_fields() {
        let holding: Holding = serde_json::from_str(
            r#"{"symbol": "BTC", "type": "Crypto", "amount": 0.5, "averageCost": 30000}"#,
        )
        .unwrap();
        assert_eq!(holding.category, Category::Crypto);
        assert_eq!(holding.name, "");
        assert_eq!(holding.purchase_date, None);
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let mut holding = Holding::new("TSLA", "Tesla", Category::Stock, -1.0, 200.0);
        assert!(holding.validate().is_err());

        holding.quantity = 1.0;
        holding.average_cost = f64::NAN;
        assert!(holding.validate().is_err());

        holding.average_cost = 0.0;
        assert!(holding.validate().is_ok());
    }
}
