//! Utility functions for rounding and formatting
//!
//! Arithmetic stays in `f64`; `Decimal` is used only where a value has to be
//! rounded to cents or rendered for display.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
///
/// Non-finite values are returned unchanged.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Format a value as US dollars with thousands separators: `$1,234.56`.
///
/// # Examples
/// ```
/// use trackfolio::utils::format_currency;
///
/// assert_eq!(format_currency(1234.5), "$1,234.50");
/// assert_eq!(format_currency(-0.456), "-$0.46");
/// ```
pub fn format_currency(value: f64) -> String {
    let Some(decimal) = Decimal::from_f64(value) else {
        return "N/A".to_string();
    };
    format_currency_decimal(decimal)
}

/// Decimal variant of [`format_currency`]
pub fn format_currency_decimal(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    format!("{}${}.{}", sign, with_separators, decimal_part)
}

/// Format a percentage with sign and 2 decimals: `+16.67%`
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    format!("{:+.2}%", round2(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2() {
        assert_eq!(round2(175.456), 175.46);
        assert_eq!(round2(-2.345), -2.35);
        assert_eq!(round2(10.0), 10.0);
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(28500.0), "$28,500.00");
        assert_eq!(format_currency(-1234567.891), "-$1,234,567.89");
        assert_eq!(format_currency(f64::INFINITY), "N/A");
    }

    #[test]
    fn test_format_currency_decimal() {
        assert_eq!(format_currency_decimal(dec!(1750)), "$1,750.00");
        assert_eq!(format_currency_decimal(dec!(12.005)), "$12.01");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(16.666666), "+16.67%");
        assert_eq!(format_percent(-5.0), "-5.00%");
        assert_eq!(format_percent(f64::NAN), "N/A");
    }
}
