use chrono::{DateTime, Local};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal as a rupee amount with lakh/crore separators: ₹12,34,567.89
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let rounded = val.abs().round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{rounded:.2}");
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    // Indian grouping: the last three digits, then pairs (12,34,567)
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i == 3 || (i > 3 && i % 2 == 1) {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-\u{20b9}{with_commas}.{dec_part}")
    } else {
        format!("\u{20b9}{with_commas}.{dec_part}")
    }
}

/// Epoch milliseconds as local `YYYY-MM-DD HH:MM`. Out-of-range values print raw.
pub fn timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

pub fn format_bytes(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
