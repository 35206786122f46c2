//! Lenient amount parsing.
//!
//! The extractor emits amounts as JSON numbers, numeric strings, or strings
//! with currency marks and thousands separators. Anything unusable becomes
//! zero ("unknown"), and negatives clamp to zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Characters stripped before parsing
const AMOUNT_NOISE: &[char] = &['¥', '￥', ',', '，', '元'];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

/// Parse an amount string, returning zero when it cannot be parsed
pub fn parse_amount(text: &str) -> Decimal {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !AMOUNT_NOISE.contains(c) && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(clamp_non_negative)
        .unwrap_or(Decimal::ZERO)
}

/// Convert a float amount, returning zero for non-finite values
pub fn amount_from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    // Go through the shortest decimal rendering so 35.5 stays 35.5
    parse_amount(&value.to_string())
}

fn clamp_non_negative(amount: Decimal) -> Decimal {
    if amount.is_sign_negative() {
        Decimal::ZERO
    } else {
        amount
    }
}

pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAmount>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawAmount::Number(value)) => amount_from_f64(value),
        Some(RawAmount::Text(text)) => parse_amount(&text),
        None => Decimal::ZERO,
    })
}
