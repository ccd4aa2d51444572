//! Simulated portfolio performance history
//!
//! No price history is stored, so the series is synthesized from current
//! quotes: every day in the range values each quoted holding at its current
//! price scaled by a random factor within ±5%.
//!
//! The comparison view works the same way: selected holdings move within
//! ±5% of their average cost, benchmark indices within ±2.5% of a fixed level.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::db::Holding;
use crate::error::TrackfolioError;
use crate::market::QuoteMap;

/// Daily price noise applied to each holding
pub const DAILY_NOISE: f64 = 0.05;

/// Daily noise for benchmark indices
pub const BENCHMARK_NOISE: f64 = 0.025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl TimeRange {
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::OneWeek => 7,
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = TrackfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1W" => Ok(TimeRange::OneWeek),
            "1M" => Ok(TimeRange::OneMonth),
            "3M" => Ok(TimeRange::ThreeMonths),
            other => Err(TrackfolioError::Validation(format!(
                "unknown range '{}' (use 1W, 1M or 3M)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One point per day from `today - days` up to yesterday
pub fn performance_series<R: Rng>(
    holdings: &[Holding],
    quotes: &QuoteMap,
    range: TimeRange,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<PerformancePoint> {
    let days = range.days();

    (0..days)
        .map(|i| {
            let date = today - Duration::days(days - i);
            let value = holdings
                .iter()
                .filter_map(|h| quotes.get(&h.symbol).map(|q| (h, q)))
                .map(|(h, q)| {
                    let factor = 1.0 + rng.random_range(-DAILY_NOISE..=DAILY_NOISE);
                    h.quantity * q.price * factor
                })
                .sum::<f64>();
            PerformancePoint { date, value }
        })
        .collect()
}

/// Market index a portfolio can be compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Benchmark {
    Spy,
    Qqq,
    Dia,
}

impl Benchmark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Benchmark::Spy => "SPY",
            Benchmark::Qqq => "QQQ",
            Benchmark::Dia => "DIA",
        }
    }

    /// Level the simulated series moves around
    pub fn base_price(&self) -> f64 {
        match self {
            Benchmark::Spy => 415.0,
            Benchmark::Qqq => 350.0,
            Benchmark::Dia => 340.0,
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Benchmark {
    type Err = TrackfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPY" => Ok(Benchmark::Spy),
            "QQQ" => Ok(Benchmark::Qqq),
            "DIA" => Ok(Benchmark::Dia),
            other => Err(TrackfolioError::Validation(format!(
                "unknown benchmark '{}' (use SPY, QQQ or DIA)",
                other
            ))),
        }
    }
}

/// One day of the comparison view, keyed by symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Per-symbol price series for `holdings` and `benchmarks` over `range`.
///
/// Dates follow [`performance_series`]. A symbol held twice is plotted once,
/// from its first holding; a benchmark that is also held keeps the benchmark line.
pub fn comparison_series<R: Rng>(
    holdings: &[Holding],
    benchmarks: &[Benchmark],
    range: TimeRange,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<ComparisonPoint> {
    let days = range.days();

    (0..days)
        .map(|i| {
            let date = today - Duration::days(days - i);
            let mut values = BTreeMap::new();
            for holding in holdings {
                let factor = 1.0 + rng.random_range(-DAILY_NOISE..=DAILY_NOISE);
                values
                    .entry(holding.symbol.clone())
                    .or_insert(holding.average_cost * factor);
            }
            for benchmark in benchmarks {
                let factor = 1.0 + rng.random_range(-BENCHMARK_NOISE..=BENCHMARK_NOISE);
                values.insert(benchmark.to_string(), benchmark.base_price() * factor);
            }
            ComparisonPoint { date, values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;
    use crate::market::Quote;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_series_length_and_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let series = performance_series(&[], &QuoteMap::new(), TimeRange::OneWeek, today, &mut rng);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 3, 24).unwrap());
        assert_eq!(series[6].date, NaiveDate::from_ymd_opt(2024, 3, 30).unwrap());
        assert!(series.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_values_stay_within_noise_band() {
        let holdings = vec![
            Holding::new("AAPL", "Apple", Category::Stock, 10.0, 150.0),
            Holding::new("NOPE", "Unquoted", Category::Other, 99.0, 1.0),
        ];
        let quotes = QuoteMap::from([(
            "AAPL".to_string(),
            Quote {
                symbol: "AAPL".to_string(),
                price: 100.0,
                change: 0.0,
                change_percent: 0.0,
            },
        )]);
        let mut rng = StdRng::seed_from_u64(99);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let series = performance_series(&holdings, &quotes, TimeRange::ThreeMonths, today, &mut rng);

        assert_eq!(series.len(), 90);
        for point in series {
            assert!((949.99..=1050.01).contains(&point.value), "{}", point.value);
        }
    }

    #[test]
    fn test_comparison_dates_and_bands() {
        let holdings = vec![
            Holding::new("AAPL", "Apple", Category::Stock, 10.0, 150.0),
            Holding::new("AAPL", "Apple again", Category::Stock, 1.0, 9999.0),
        ];
        let benchmarks = [Benchmark::Spy, Benchmark::Qqq, Benchmark::Dia];
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let series = comparison_series(&holdings, &benchmarks, TimeRange::OneMonth, today, &mut rng);

        assert_eq!(series.len(), 30);
        // 2024 is a leap year
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(series[29].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        for point in &series {
            assert_eq!(point.values.len(), 4);
            let apple = point.values["AAPL"];
            assert!((142.49..=157.51).contains(&apple), "AAPL {}", apple);
            for benchmark in benchmarks {
                let value = point.values[benchmark.as_str()];
                let base = benchmark.base_price();
                assert!(
                    (base * 0.975 - 0.01..=base * 1.025 + 0.01).contains(&value),
                    "{} {}",
                    benchmark,
                    value
                );
            }
        }
    }

    #[test]
    fn test_comparison_json_is_flat() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let series = comparison_series(&[], &[Benchmark::Dia], TimeRange::OneWeek, today, &mut rng);
        let json = serde_json::to_value(&series[0]).unwrap();

        assert_eq!(json["date"], "2024-01-01");
        assert!(json["DIA"].is_number());
    }

    #[test]
    fn test_parse_benchmark() {
        assert_eq!("spy".parse::<Benchmark>().unwrap(), Benchmark::Spy);
        assert_eq!(" dia ".parse::<Benchmark>().unwrap().base_price(), 340.0);
        assert!("VTI".parse::<Benchmark>().is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("1m".parse::<TimeRange>().unwrap(), TimeRange::OneMonth);
        assert_eq!("3M".parse::<TimeRange>().unwrap().days(), 90);
        assert!("1Y".parse::<TimeRange>().is_err());
    }
}
