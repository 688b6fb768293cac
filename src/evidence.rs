use crate::amount::extract_amount;
use crate::direction::DirectionScore;
use crate::patterns::library;

/// Explicit sign that money moved: a transaction verb, a transfer rail, or a card reference.
pub fn has_transaction_evidence(body: &str) -> bool {
    library().evidence.any_match(body)
}

/// Weaker fallback: an extractable amount plus at least one debit or credit word.
pub fn has_amount_with_direction_context(body: &str) -> bool {
    extract_amount(body).is_some() && DirectionScore::of(body).has_evidence()
}

/// Gate applied in strict mode only.
pub fn passes_strict_gate(body: &str) -> bool {
    has_transaction_evidence(body) || has_amount_with_direction_context(body)
}
