use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{Category, Holding};
use crate::market::QuoteMap;

/// Gain figures for the best or worst performing holding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub symbol: String,
    pub name: String,
    pub gain: f64,
    pub gain_percent: f64,
}

/// Derived portfolio summary, recomputed from scratch on every change
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain: f64,
    pub gain_percentage: f64,
    pub best_performer: Option<Performer>,
    pub worst_performer: Option<Performer>,
    pub allocation: BTreeMap<Category, f64>,
}

/// Valuation of a single holding; market fields are `None` without a quote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub holding: Holding,
    pub cost_basis: f64,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub gain: Option<f64>,
    pub gain_percent: Option<f64>,
}

/// gain / cost × 100, or 0 when there is no cost
pub fn gain_percent(gain: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        (gain / cost) * 100.0
    } else {
        0.0
    }
}

/// Roll holdings and quotes up into an [`AggregateSnapshot`].
///
/// Holdings without a quote are skipped for every total. Ties for best and
/// worst performer keep the first holding seen. Categories are included in
/// the allocation as soon as one quoted holding belongs to them, even at a
/// value of zero.
pub fn aggregate(holdings: &[Holding], quotes: &QuoteMap) -> AggregateSnapshot {
    let mut total_value = 0.0;
    let mut total_cost = 0.0;
    let mut best: Option<Performer> = None;
    let mut worst: Option<Performer> = None;
    let mut allocation: BTreeMap<Category, f64> = BTreeMap::new();

    for holding in holdings {
        let Some(quote) = quotes.get(&holding.symbol) else {
            continue;
        };

        let current_value = holding.quantity * quote.price;
        let cost_basis = holding.cost_basis();
        let gain = current_value - cost_basis;
        let pct = gain_percent(gain, cost_basis);

        total_value += current_value;
        total_cost += cost_basis;

        if best.as_ref().map_or(true, |b| pct > b.gain_percent) {
            best = Some(performer(holding, gain, pct));
        }
        if worst.as_ref().map_or(true, |w| pct < w.gain_percent) {
            worst = Some(performer(holding, gain, pct));
        }

        *allocation.entry(holding.category).or_insert(0.0) += current_value;
    }

    let total_gain = total_value - total_cost;

    AggregateSnapshot {
        total_value,
        total_cost,
        total_gain,
        gain_percentage: gain_percent(total_gain, total_cost),
        best_performer: best,
        worst_performer: worst,
        allocation,
    }
}

fn performer(holding: &Holding, gain: f64, gain_percent: f64) -> Performer {
    Performer {
        symbol: holding.symbol.clone(),
        name: holding.name.clone(),
        gain,
        gain_percent,
    }
}

/// Per-holding valuation rows, in input order
pub fn value_positions(holdings: &[Holding], quotes: &QuoteMap) -> Vec<PositionValuation> {
    holdings
        .iter()
        .map(|holding| {
            let cost_basis = holding.cost_basis();
            let quote = quotes.get(&holding.symbol);
            let current_value = quote.map(|q| holding.quantity * q.price);
            let gain = current_value.map(|v| v - cost_basis);

            PositionValuation {
                holding: holding.clone(),
                cost_basis,
                price: quote.map(|q| q.price),
                change_percent: quote.map(|q| q.change_percent),
                current_value,
                gain,
                gain_percent: gain.map(|g| gain_percent(g, cost_basis)),
            }
        })
        .collect()
}

/// Allocation slice with its share of the total value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub category: Category,
    pub value: f64,
    pub percent: f64,
}

/// Allocation sorted by value (largest first) with percentages of the total
pub fn allocation_breakdown(snapshot: &AggregateSnapshot) -> Vec<AllocationSlice> {
    let mut slices: Vec<AllocationSlice> = snapshot
        .allocation
        .iter()
        .map(|(category, value)| AllocationSlice {
            category: *category,
            value: *value,
            percent: if snapshot.total_value > 0.0 {
                value / snapshot.total_value * 100.0
            } else {
                0.0
            },
        })
        .collect();

    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    slices
}
