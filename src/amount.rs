use std::str::FromStr;

use rust_decimal::Decimal;

use crate::patterns::{library, PatternSet};

/// Smallest amount a parsed transaction may carry.
pub const MIN_AMOUNT: Decimal = Decimal::ONE;
/// Largest amount a parsed transaction may carry (100 million).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Strip thousands separators and stray quoting, then parse as a decimal.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.replace(',', "").replace('"', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// Amount from the first rule, in table order, with a capture that parses.
pub fn extract_amount(body: &str) -> Option<Decimal> {
    extract_amount_with(&library().amount, body)
}

pub fn extract_amount_with(rules: &PatternSet, body: &str) -> Option<Decimal> {
    rules
        .rules()
        .iter()
        .find_map(|r| r.captures(body).find_map(parse_amount))
}

pub fn is_in_range(amount: Decimal) -> bool {
    amount >= MIN_AMOUNT && amount <= MAX_AMOUNT
}

/// Locale-free rendering used inside dedup keys: trailing zeros dropped,
/// always at least one fractional digit (`500` -> `500.0`).
pub fn canonical_amount(amount: Decimal) -> String {
    let normalized = amount.normalize();
    if normalized.scale() == 0 {
        format!("{normalized}.0")
    } else {
        normalized.to_string()
    }
}
