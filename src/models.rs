use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One message as delivered by the inbox reader. Never built by the classifier itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub sender: String,
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub received_at: i64,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, sender: impl Into<String>, body: impl Into<String>, received_at: i64) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            body: body.into(),
            received_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message that classified as a completed money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub amount: Decimal,
    pub direction: Direction,
    pub institution: String,
    /// `None` means no counterparty could be read; `description_snippet` then carries the body.
    pub merchant_guess: Option<String>,
    pub description_snippet: String,
    pub occurred_at: i64,
    /// Lowercase SHA-256 hex of `sender|occurred_at|amount`.
    pub dedup_key: String,
    pub raw_text: String,
}

/// Why a message was skipped. Terminal for that message, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    Informational { rule: String },
    NoTransactionIndicator,
    AmountNotFound,
    AmountOutOfRange { amount: Decimal },
    VerifierRejected { reason: String },
}

impl RejectReason {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Informational { .. } => "informational",
            Self::NoTransactionIndicator => "no_transaction_indicator",
            Self::AmountNotFound => "amount_not_found",
            Self::AmountOutOfRange { .. } => "amount_out_of_range",
            Self::VerifierRejected { .. } => "verifier_rejected",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informational { rule } => write!(f, "informational message ({rule})"),
            Self::NoTransactionIndicator => f.write_str("no clear transaction indicator"),
            Self::AmountNotFound => f.write_str("no amount found"),
            Self::AmountOutOfRange { amount } => write!(f, "amount {amount} out of range"),
            Self::VerifierRejected { reason } => write!(f, "rejected by verifier: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParseOutcome {
    Parsed(ParsedTransaction),
    Rejected { reason: RejectReason },
}

impl ParseOutcome {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn transaction(&self) -> Option<&ParsedTransaction> {
        match self {
            Self::Parsed(txn) => Some(txn),
            Self::Rejected { .. } => None,
        }
    }

    pub fn into_transaction(self) -> Option<ParsedTransaction> {
        match self {
            Self::Parsed(txn) => Some(txn),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Parsed(_) => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Require explicit transaction evidence before extracting anything.
    #[default]
    Strict,
    /// Skip the evidence check and let the external verifier hold the veto.
    Hybrid,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Hybrid => "hybrid",
        }
    }
}
