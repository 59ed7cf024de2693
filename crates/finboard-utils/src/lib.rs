//! Formatting helpers for rendering amounts
//!
//! Amounts stay exact `Decimal` values everywhere else; rounding happens
//! only in the functions below, at the moment something is displayed or
//! exported.

use rust_decimal::{Decimal, RoundingStrategy};

/// Separators used when rendering an amount for people
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_places: u32,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

/// Round half away from zero, then pad to exactly `decimal_places` digits
pub fn round_amount(amount: Decimal, decimal_places: u32) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimal_places);
    rounded
}

/// Plain machine-readable rendering, e.g. `1234.50`
pub fn format_decimal(amount: Decimal, decimal_places: u32) -> String {
    round_amount(amount, decimal_places).to_string()
}

/// Insert a separator every three digits of an unsigned integer string
pub fn group_thousands(digits: &str, separator: &str) -> String {
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Human rendering with separators, e.g. `-1.234,50`
pub fn format_amount(amount: Decimal, format: &NumberFormat) -> String {
    let plain = format_decimal(amount, format.decimal_places);
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::from(sign);
    out.push_str(&group_thousands(int_part, &format.thousands_separator));
    if let Some(frac) = frac_part {
        out.push_str(&format.decimal_separator);
        out.push_str(frac);
    }
    out
}
