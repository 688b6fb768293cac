//! Classification pipeline.
//!
//! informational veto -> evidence gate (strict only) -> amount -> range ->
//! direction -> institution/merchant -> dedup key. Every message ends in
//! exactly one `Parsed` or `Rejected`; nothing here returns an error or panics
//! on odd input, and a rejection never affects the rest of a batch.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::amount::{extract_amount, is_in_range};
use crate::dedup::compute_dedup_key;
use crate::direction::resolve_direction;
use crate::evidence::passes_strict_gate;
use crate::identity::{description_snippet, extract_institution, extract_merchant};
use crate::informational::informational_category;
use crate::models::{ParseMode, ParseOutcome, ParsedTransaction, RawMessage, RejectReason};
use crate::verifier::{verify_with_timeout, Verdict, Verifier, DEFAULT_TIMEOUT};

#[derive(Clone)]
pub struct Classifier {
    mode: ParseMode,
    verifier: Option<Arc<dyn Verifier>>,
    timeout: Duration,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ParseMode::default())
    }
}

impl Classifier {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            verifier: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Only consulted in [`ParseMode::Hybrid`].
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn has_verifier(&self) -> bool {
        self.verifier.is_some()
    }

    /// Local rules only. Pure: the same message always yields the same outcome.
    pub fn classify(&self, message: &RawMessage) -> ParseOutcome {
        into_outcome(message, classify_local(message, self.mode))
    }

    /// One outcome per input message, in input order.
    pub fn classify_all(&self, messages: &[RawMessage]) -> Vec<ParseOutcome> {
        let outcomes: Vec<ParseOutcome> = messages.iter().map(|m| self.classify(m)).collect();
        log_batch(&outcomes);
        outcomes
    }

    /// Batch convenience: keep only the messages that parsed.
    pub fn transactions(&self, messages: &[RawMessage]) -> Vec<ParsedTransaction> {
        messages
            .iter()
            .filter_map(|m| self.classify(m).into_transaction())
            .collect()
    }

    /// Local rules, then the verifier when running hybrid with one configured.
    pub async fn classify_verified(&self, message: &RawMessage) -> ParseOutcome {
        let txn = match classify_local(message, self.mode) {
            Ok(txn) => txn,
            Err(reason) => return into_outcome(message, Err(reason)),
        };
        let (ParseMode::Hybrid, Some(verifier)) = (self.mode, &self.verifier) else {
            return ParseOutcome::Parsed(txn);
        };
        let verdict = verify_with_timeout(verifier.as_ref(), &message.body, self.timeout).await;
        into_outcome(message, apply_verdict(txn, verdict))
    }

    pub async fn classify_all_verified(&self, messages: &[RawMessage]) -> Vec<ParseOutcome> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            outcomes.push(self.classify_verified(message).await);
        }
        log_batch(&outcomes);
        outcomes
    }
}

pub fn parse(message: &RawMessage, mode: ParseMode) -> ParseOutcome {
    Classifier::new(mode).classify(message)
}

pub fn parse_all(messages: &[RawMessage], mode: ParseMode) -> Vec<ParseOutcome> {
    Classifier::new(mode).classify_all(messages)
}

pub fn parse_transactions(messages: &[RawMessage], mode: ParseMode) -> Vec<ParsedTransaction> {
    Classifier::new(mode).transactions(messages)
}

fn classify_local(message: &RawMessage, mode: ParseMode) -> Result<ParsedTransaction, RejectReason> {
    let body = message.body.as_str();

    if let Some(category) = informational_category(body) {
        return Err(RejectReason::Informational {
            rule: category.key().to_string(),
        });
    }

    if mode == ParseMode::Strict && !passes_strict_gate(body) {
        return Err(RejectReason::NoTransactionIndicator);
    }

    let amount = extract_amount(body).ok_or(RejectReason::AmountNotFound)?;
    if !is_in_range(amount) {
        return Err(RejectReason::AmountOutOfRange { amount });
    }

    let direction = resolve_direction(body);
    let institution = extract_institution(&message.sender);
    let merchant_guess = extract_merchant(body);
    let description_snippet = description_snippet(merchant_guess.as_deref(), body);

    Ok(ParsedTransaction {
        amount,
        direction,
        institution,
        merchant_guess,
        description_snippet,
        occurred_at: message.received_at,
        dedup_key: compute_dedup_key(&message.sender, message.received_at, amount),
        raw_text: message.body.clone(),
    })
}

fn apply_verdict(mut txn: ParsedTransaction, verdict: Option<Verdict>) -> Result<ParsedTransaction, RejectReason> {
    let Some(verdict) = verdict else {
        return Ok(txn);
    };
    if !verdict.is_transaction {
        return Err(RejectReason::VerifierRejected { reason: verdict.reason });
    }
    if let Some(direction) = verdict.direction {
        if direction != txn.direction {
            debug!(from = %txn.direction, to = %direction, "verifier overrode direction");
            txn.direction = direction;
        }
    }
    Ok(txn)
}

fn into_outcome(message: &RawMessage, result: Result<ParsedTransaction, RejectReason>) -> ParseOutcome {
    match result {
        Ok(txn) => ParseOutcome::Parsed(txn),
        Err(reason) => {
            debug!(id = %message.id, sender = %message.sender, reason = %reason, "message rejected");
            ParseOutcome::rejected(reason)
        }
    }
}

fn log_batch(outcomes: &[ParseOutcome]) {
    let parsed = outcomes.iter().filter(|o| o.is_parsed()).count();
    info!(parsed, rejected = outcomes.len() - parsed, "classified batch");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use sha2::{Digest, Sha256};

    const T: i64 = 1_704_441_600_000;

    fn msg(sender: &str, body: &str) -> RawMessage {
        RawMessage::new("m1", sender, body, T)
    }

    fn reason(outcome: &ParseOutcome) -> &RejectReason {
        outcome.reject_reason().expect("expected a rejection")
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl Verifier for Fixed {
        async fn verify(&self, _text: &str) -> anyhow::Result<Verdict> {
            crate::verifier::parse_verdict(self.0)
        }
    }

    struct Hang;

    #[async_trait]
    impl Verifier for Hang {
        async fn verify(&self, _text: &str) -> anyhow::Result<Verdict> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            crate::verifier::parse_verdict("NO|NONE|-")
        }
    }

    #[test]
    fn test_scenario_debit_at_merchant() {
        let outcome = parse(
            &msg(
                "VM-HDFCBK",
                "Rs.500.00 debited from A/c XX1234 on 05-01-24 at SWIGGY. Avl Bal Rs 4500.00",
            ),
            ParseMode::Strict,
        );
        let txn = outcome.transaction().expect("should parse");
        assert_eq!(txn.amount, dec!(500.00));
        assert_eq!(txn.direction, Direction::Debit);
        assert_eq!(txn.institution, "HDFC Bank");
        assert_eq!(txn.merchant_guess.as_deref(), Some("SWIGGY"));
        assert_eq!(txn.description_snippet, "SWIGGY");
        assert_eq!(txn.occurred_at, T);
        let expected = hex::encode(Sha256::digest(format!("VM-HDFCBK|{T}|500.0").as_bytes()));
        assert_eq!(txn.dedup_key, expected);
    }

    #[test]
    fn test_scenario_plan_expiry() {
        let outcome = parse(
            &msg("JIO", "Your Jio plan will expire today. Recharge before due date."),
            ParseMode::Strict,
        );
        assert!(reason(&outcome).to_string().contains("informational"));
    }

    #[test]
    fn test_scenario_otp() {
        let outcome = parse(
            &msg("AX-SBIINB", "OTP is 834521 for your transaction. Do not share."),
            ParseMode::Hybrid,
        );
        assert!(matches!(reason(&outcome), RejectReason::Informational { rule } if rule == "otp"));
    }

    #[test]
    fn test_scenario_neft_credit() {
        let outcome = parse(
            &msg("HDFCBK", "Rs 10,000 credited to your A/c XX1234 via NEFT from JOHN DOE"),
            ParseMode::Strict,
        );
        let txn = outcome.transaction().expect("should parse");
        assert_eq!(txn.amount, dec!(10000));
        assert_eq!(txn.direction, Direction::Credit);
        assert_eq!(txn.merchant_guess.as_deref(), Some("JOHN DOE"));
    }

    #[test]
    fn test_credit_card_bill_paid() {
        let txn = parse(&msg("SBICRD", "Your credit card bill of Rs 5000 is paid"), ParseMode::Strict)
            .into_transaction()
            .expect("should parse");
        assert_eq!(txn.direction, Direction::Debit);
        assert_eq!(txn.institution, "SBI Card");
        assert_eq!(txn.merchant_guess, None);
        assert_eq!(txn.description_snippet, "Your credit card bill of Rs 5000 is paid");
    }

    #[test]
    fn test_credit_to_debit_card() {
        let txn = parse(&msg("VM-HDFCBK", "Rs 1,200 credited to your Debit Card ending 4421"), ParseMode::Strict)
            .into_transaction()
            .expect("should parse");
        assert_eq!(txn.direction, Direction::Credit);
        assert_eq!(txn.amount, dec!(1200));
    }

    #[test]
    fn test_native_digits_do_not_hide_amount() {
        let txn = parse(&msg("VM-HDFCBK", "Rs ५०० debited, Rs 700 charged"), ParseMode::Strict)
            .into_transaction()
            .expect("should parse");
        assert_eq!(txn.amount, dec!(700));
        assert_eq!(txn.direction, Direction::Debit);
    }

    #[test]
    fn test_veto_wins_in_every_mode() {
        let bodies = [
            "Reminder: Rs 2,499 debited next week for your plan",
            "RAHUL has requested Rs 500. Pay via UPI",
            "Your A/c balance is Rs 12,400.00",
            "Rs 1,00,000 pre-approved loan credited instantly, apply now",
        ];
        for body in bodies {
            for mode in [ParseMode::Strict, ParseMode::Hybrid] {
                let outcome = parse(&msg("VM-HDFCBK", body), mode);
                assert!(
                    matches!(reason(&outcome), RejectReason::Informational { .. }),
                    "{body} should be vetoed in {mode:?}"
                );
            }
        }
    }

    #[test]
    fn test_strict_requires_indicator_hybrid_does_not() {
        let message = msg("AD-BIGBKT", "Rs 499 at BIGBASKET");
        assert_eq!(
            reason(&parse(&message, ParseMode::Strict)),
            &RejectReason::NoTransactionIndicator
        );
        let txn = parse(&message, ParseMode::Hybrid).into_transaction().expect("hybrid should parse");
        assert_eq!(txn.direction, Direction::Debit);
        assert_eq!(txn.institution, "BIGBKT");
        assert_eq!(txn.merchant_guess.as_deref(), Some("BIGBASKET"));
    }

    #[test]
    fn test_amount_not_found() {
        let outcome = parse(&msg("HDFCBK", "Amount debited from your account"), ParseMode::Strict);
        assert_eq!(reason(&outcome), &RejectReason::AmountNotFound);
    }

    #[test]
    fn test_amount_out_of_range() {
        let low = parse(&msg("HDFCBK", "Rs 0.50 debited as charges"), ParseMode::Strict);
        assert_eq!(reason(&low), &RejectReason::AmountOutOfRange { amount: dec!(0.50) });
        let high = parse(&msg("HDFCBK", "Rs 250000000 credited"), ParseMode::Strict);
        assert!(matches!(reason(&high), RejectReason::AmountOutOfRange { .. }));
    }

    #[test]
    fn test_garbage_never_panics() {
        let inputs = [
            String::new(),
            "\u{0}\u{fffd}\u{7f}ÿþ".to_string(),
            "Rs 999999999999999999999999999999999999 debited".to_string(),
            "₹".repeat(10_000),
            "12,34,56,78,90,12,34,56,78,90 paid".to_string(),
        ];
        for body in &inputs {
            for mode in [ParseMode::Strict, ParseMode::Hybrid] {
                let outcome = parse(&msg("X", body), mode);
                if let Some(txn) = outcome.transaction() {
                    assert!(is_in_range(txn.amount));
                }
            }
        }
        assert!(!parse(&msg("X", ""), ParseMode::Hybrid).is_parsed());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let message = msg("VM-HDFCBK", "INR 349.00 spent on Card XX4421 at AMAZON on 2024-01-05");
        assert_eq!(parse(&message, ParseMode::Strict), parse(&message, ParseMode::Strict));
    }

    #[test]
    fn test_batch_yields_one_outcome_per_message() {
        let messages = vec![
            msg("VM-HDFCBK", "Rs 120 debited at CHAI POINT. Avl Bal Rs 900"),
            msg("JIO", "Your plan will expire today"),
            msg("HDFCBK", "hello"),
            msg("HDFCBK", "Rs 10,000 credited to your A/c XX1234 via NEFT from JOHN DOE"),
        ];
        let outcomes = parse_all(&messages, ParseMode::Strict);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes.iter().map(|o| o.is_parsed()).collect::<Vec<_>>(),
            vec![true, false, false, true]
        );

        let txns = parse_transactions(&messages, ParseMode::Strict);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[1].direction, Direction::Credit);
    }

    #[test]
    fn test_same_sender_time_amount_share_key() {
        let a = parse(&RawMessage::new("a", "HDFCBK", "Rs 500 debited at ZEPTO. ", T), ParseMode::Strict);
        let b = parse(&RawMessage::new("b", "HDFCBK", "Rs 500.00 spent at BLINKIT. ", T), ParseMode::Strict);
        assert_eq!(a.transaction().unwrap().dedup_key, b.transaction().unwrap().dedup_key);
    }

    #[test]
    fn test_concurrent_calls_agree() {
        let message = msg("VM-HDFCBK", "Rs.500.00 debited from A/c XX1234 at SWIGGY. Avl Bal Rs 4500.00");
        let expected = parse(&message, ParseMode::Strict);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| parse(&message, ParseMode::Strict))).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[tokio::test]
    async fn test_verifier_overrides_direction() {
        let classifier = Classifier::new(ParseMode::Hybrid).with_verifier(Arc::new(Fixed("YES|CREDIT|9999|salary")));
        let outcome = classifier.classify_verified(&msg("HDFCBK", "Rs 499 at BIGBASKET")).await;
        let txn = outcome.transaction().expect("should parse");
        assert_eq!(txn.direction, Direction::Credit);
        // the verifier's amount is advisory only
        assert_eq!(txn.amount, dec!(499));
    }

    #[tokio::test]
    async fn test_verifier_can_reject() {
        let classifier = Classifier::new(ParseMode::Hybrid).with_verifier(Arc::new(Fixed("NO|NONE|-|advert")));
        let outcome = classifier.classify_verified(&msg("HDFCBK", "Rs 499 at BIGBASKET")).await;
        assert_eq!(
            reason(&outcome),
            &RejectReason::VerifierRejected { reason: "advert".to_string() }
        );
    }

    #[tokio::test]
    async fn test_verifier_cannot_lift_veto() {
        let classifier = Classifier::new(ParseMode::Hybrid).with_verifier(Arc::new(Fixed("YES|DEBIT|-")));
        let outcome = classifier
            .classify_verified(&msg("AX-SBIINB", "OTP is 834521 for your transaction of Rs 500"))
            .await;
        assert!(matches!(reason(&outcome), RejectReason::Informational { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verifier_timeout_falls_back_to_local() {
        let classifier = Classifier::new(ParseMode::Hybrid)
            .with_verifier(Arc::new(Hang))
            .with_timeout(Duration::from_millis(100));
        let message = msg("HDFCBK", "Rs 499 at BIGBASKET");
        assert_eq!(classifier.classify_verified(&message).await, classifier.classify(&message));
    }

    #[tokio::test]
    async fn test_strict_mode_ignores_verifier() {
        let classifier = Classifier::new(ParseMode::Strict).with_verifier(Arc::new(Fixed("NO|NONE|-")));
        let outcome = classifier
            .classify_verified(&msg("HDFCBK", "Rs 250 debited from A/c XX1234"))
            .await;
        assert!(outcome.is_parsed());
    }

    #[tokio::test]
    async fn test_verified_batch_keeps_order() {
        let classifier = Classifier::new(ParseMode::Hybrid).with_verifier(Arc::new(Fixed("YES|NONE|-")));
        let messages = vec![
            msg("JIO", "Recharge now and get upto 2GB extra"),
            msg("HDFCBK", "Rs 80 debited at METRO. "),
        ];
        let outcomes = classifier.classify_all_verified(&messages).await;
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_parsed());
        assert_eq!(outcomes[1].transaction().unwrap().direction, Direction::Debit);
    }
}
