use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::amount::canonical_amount;

/// Idempotency key for ingestion: SHA-256 of `sender|occurred_at|amount`, lowercase hex.
///
/// Two messages with the same sender, timestamp and amount share a key and
/// the store keeps only the first.
pub fn compute_dedup_key(sender: &str, occurred_at: i64, amount: Decimal) -> String {
    let material = format!("{sender}|{occurred_at}|{}", canonical_amount(amount));
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}
