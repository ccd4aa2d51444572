//! Rebalancing suggestions
//!
//! Given target weights for some symbols, compute the trades that move the
//! portfolio toward them. Symbols without an explicit target share whatever
//! percentage is left over.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::db::Holding;
use crate::market::QuoteMap;

/// Differences at or below this dollar amount are not worth a trade
pub const MIN_TRADE_VALUE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("BUY"),
            TradeSide::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceAction {
    pub symbol: String,
    pub side: TradeSide,
    /// Units to trade at the current price
    pub units: f64,
    /// Dollar value of the trade
    pub value: f64,
    pub current_percent: f64,
    pub target_percent: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct CurrentPosition {
    value: f64,
    percent: f64,
}

/// Suggest trades to reach `targets` (symbol, percent of total value).
///
/// Explicit targets are processed first in the given order, then every other
/// held symbol in holding order. Returns nothing when the portfolio has no
/// market value.
pub fn suggest_rebalance(
    holdings: &[Holding],
    quotes: &QuoteMap,
    targets: &[(String, f64)],
) -> Vec<RebalanceAction> {
    let price_of = |symbol: &str| quotes.get(symbol).map(|q| q.price);

    let total_value: f64 = holdings
        .iter()
        .map(|h| price_of(&h.symbol).unwrap_or(0.0) * h.quantity)
        .sum();

    if total_value <= 0.0 {
        return Vec::new();
    }

    // Later holdings with the same symbol overwrite earlier ones, so each
    // symbol keeps the valuation of its last position.
    let mut current: HashMap<&str, CurrentPosition> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for holding in holdings {
        let value = price_of(&holding.symbol).unwrap_or(0.0) * holding.quantity;
        if !current.contains_key(holding.symbol.as_str()) {
            order.push(&holding.symbol);
        }
        current.insert(
            &holding.symbol,
            CurrentPosition {
                value,
                percent: value / total_value * 100.0,
            },
        );
    }

    let mut actions = Vec::new();
    let mut remaining_percent = 100.0;
    let mut targeted: Vec<&str> = Vec::new();

    for (symbol, target_percent) in targets {
        if *target_percent <= 0.0 {
            continue;
        }
        let position = current.get(symbol.as_str()).copied().unwrap_or_default();
        let target_value = target_percent / 100.0 * total_value;

        if let Some(action) = trade_for(
            symbol,
            target_value - position.value,
            price_of(symbol),
            position.percent,
            *target_percent,
        ) {
            actions.push(action);
        }

        remaining_percent -= target_percent;
        targeted.push(symbol);
    }

    let others: Vec<&str> = order
        .into_iter()
        .filter(|s| !targeted.contains(s))
        .collect();

    if !others.is_empty() {
        let remaining_value = remaining_percent / 100.0 * total_value;
        let shown_target = remaining_percent / others.len() as f64;

        for symbol in others {
            let position = current.get(symbol).copied().unwrap_or_default();
            if let Some(action) = trade_for(
                symbol,
                remaining_value - position.value,
                price_of(symbol),
                position.percent,
                shown_target,
            ) {
                actions.push(action);
            }
        }
    }

    actions
}

fn trade_for(
    symbol: &str,
    difference: f64,
    price: Option<f64>,
    current_percent: f64,
    target_percent: f64,
) -> Option<RebalanceAction> {
    if difference.abs() <= MIN_TRADE_VALUE {
        return None;
    }

    // Unknown prices are treated as 1 so the unit count equals the dollar value
    let price = price.filter(|p| *p > 0.0).unwrap_or(1.0);

    Some(RebalanceAction {
        symbol: symbol.to_string(),
        side: if difference > 0.0 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        },
        units: difference.abs() / price,
        value: difference.abs(),
        current_percent,
        target_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;
    use crate::market::Quote;

    fn quotes(prices: &[(&str, f64)]) -> QuoteMap {
        prices
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.to_string(),
                    Quote {
                        symbol: symbol.to_string(),
                        price: *price,
                        change: 0.0,
                        change_percent: 0.0,
                    },
                )
            })
            .collect()
    }

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::new("AAPL", "Apple", Category::Stock, 10.0, 150.0),
            Holding::new("BTC", "Bitcoin", Category::Crypto, 0.1, 20000.0),
        ]
    }

    #[test]
    fn test_explicit_target_produces_buy_and_sell() {
        // AAPL 10 × 100 = 1000, BTC 0.1 × 30000 = 3000, total 4000
        let q = quotes(&[("AAPL", 100.0), ("BTC", 30000.0)]);
        let targets = vec![("AAPL".to_string(), 50.0)];

        let actions = suggest_rebalance(&holdings(), &q, &targets);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].symbol, "AAPL");
        assert_eq!(actions[0].side, TradeSide::Buy);
        assert_eq!(actions[0].value, 1000.0);
        assert_eq!(actions[0].units, 10.0);
        assert_eq!(actions[0].current_percent, 25.0);

        // remaining 50% goes to BTC: 2000 target vs 3000 held
        assert_eq!(actions[1].symbol, "BTC");
        assert_eq!(actions[1].side, TradeSide::Sell);
        assert_eq!(actions[1].value, 1000.0);
        assert_eq!(actions[1].target_percent, 50.0);
    }

    #[test]
    fn test_small_differences_are_ignored() {
        let q = quotes(&[("AAPL", 100.0), ("BTC", 10000.0)]);
        let targets = vec![("AAPL".to_string(), 50.0), ("BTC".to_string(), 50.0)];

        assert!(suggest_rebalance(&holdings(), &q, &targets).is_empty());
    }

    #[test]
    fn test_no_value_means_no_actions() {
        let targets = vec![("AAPL".to_string(), 100.0)];
        assert!(suggest_rebalance(&holdings(), &QuoteMap::new(), &targets).is_empty());
        assert!(suggest_rebalance(&[], &quotes(&[("AAPL", 1.0)]), &targets).is_empty());
    }

    #[test]
    fn test_target_for_unheld_symbol_buys_it() {
        let q = quotes(&[("AAPL", 100.0), ("BTC", 30000.0), ("ETH", 2000.0)]);
        let targets = vec![("ETH".to_string(), 25.0)];

        let actions = suggest_rebalance(&holdings(), &q, &targets);

        assert_eq!(actions[0].symbol, "ETH");
        assert_eq!(actions[0].side, TradeSide::Buy);
        assert_eq!(actions[0].value, 1000.0);
        assert_eq!(actions[0].units, 0.5);
        assert_eq!(actions[0].current_percent, 0.0);
    }
}
