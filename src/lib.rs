//! Rule-based classification of bank and wallet SMS alerts.
//!
//! Given a raw message, decide whether it records a completed money movement
//! and, if so, pull out the amount, direction, institution, counterparty and a
//! stable dedup key. Everything runs offline against static rule tables; an
//! optional [`verifier::Verifier`] can be plugged in for a second opinion.
//!
//! ```no_run
//! use smsledger::models::{ParseMode, RawMessage};
//!
//! let msg = RawMessage::new("1", "VM-HDFCBK", "Rs.500.00 debited from A/c XX1234 at SWIGGY. ", 0);
//! let outcome = smsledger::parser::parse(&msg, ParseMode::Strict);
//! assert!(outcome.is_parsed());
//! ```

pub mod amount;
pub mod db;
pub mod dedup;
pub mod direction;
pub mod error;
pub mod evidence;
pub mod fmt;
pub mod identity;
pub mod importer;
pub mod informational;
pub mod models;
pub mod parser;
pub mod patterns;
pub mod settings;
pub mod verifier;
