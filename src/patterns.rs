//! Static rule tables used by every classification stage.
//!
//! Each table is an ordered list. Amount and merchant lookups take the first
//! rule that produces a usable capture; direction scoring counts every rule
//! that fires; the informational veto and the evidence check are a plain OR.
//!
//! The `regex` crate has no look-around, so rules that need a negative
//! look-ahead carry an `unless_followed_by` guard that is tested against the
//! text right after each occurrence.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    // informational
    Expiry,
    Status,
    Reminder,
    BalanceInquiry,
    Otp,
    Promotion,
    AccountLifecycle,
    PaymentRequest,
    BillDue,
    // positive evidence
    TransactionVerb,
    TransferRail,
    CardReference,
    // amount
    CurrencySymbol,
    CurrencyWord,
    AmountLabel,
    DecimalFallback,
    IntegerFallback,
    // direction
    DebitEvidence,
    CreditEvidence,
    // merchant
    VirtualAddress,
    NamedCounterparty,
    VpaLabel,
    UpiLabel,
    ForVia,
}

impl RuleCategory {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Expiry => "expiry",
            Self::Status => "status",
            Self::Reminder => "reminder",
            Self::BalanceInquiry => "balance_inquiry",
            Self::Otp => "otp",
            Self::Promotion => "promotion",
            Self::AccountLifecycle => "account_lifecycle",
            Self::PaymentRequest => "payment_request",
            Self::BillDue => "bill_due",
            Self::TransactionVerb => "transaction_verb",
            Self::TransferRail => "transfer_rail",
            Self::CardReference => "card_reference",
            Self::CurrencySymbol => "currency_symbol",
            Self::CurrencyWord => "currency_word",
            Self::AmountLabel => "amount_label",
            Self::DecimalFallback => "decimal_fallback",
            Self::IntegerFallback => "integer_fallback",
            Self::DebitEvidence => "debit",
            Self::CreditEvidence => "credit",
            Self::VirtualAddress => "virtual_address",
            Self::NamedCounterparty => "named_counterparty",
            Self::VpaLabel => "vpa_label",
            Self::UpiLabel => "upi_label",
            Self::ForVia => "for_via",
        }
    }
}

/// Uncompiled rule as written in the tables below.
struct RuleSpec {
    pattern: &'static str,
    unless_followed_by: Option<&'static str>,
    category: RuleCategory,
}

const fn rule(pattern: &'static str, category: RuleCategory) -> RuleSpec {
    RuleSpec {
        pattern,
        unless_followed_by: None,
        category,
    }
}

const fn guarded(pattern: &'static str, unless_followed_by: &'static str, category: RuleCategory) -> RuleSpec {
    RuleSpec {
        pattern,
        unless_followed_by: Some(unless_followed_by),
        category,
    }
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    unless_followed_by: Option<Regex>,
    category: RuleCategory,
}

impl PatternRule {
    fn compile(spec: &RuleSpec) -> Result<Self> {
        let unless_followed_by = match spec.unless_followed_by {
            Some(guard) => Some(Regex::new(guard)?),
            None => None,
        };
        Ok(Self {
            regex: Regex::new(spec.pattern)?,
            unless_followed_by,
            category: spec.category,
        })
    }

    pub fn category(&self) -> RuleCategory {
        self.category
    }

    fn guard_allows(&self, text: &str, end: usize) -> bool {
        match &self.unless_followed_by {
            Some(guard) => !guard.is_match(&text[end..]),
            None => true,
        }
    }

    /// True when at least one occurrence survives the guard.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex
            .find_iter(text)
            .any(|m| self.guard_allows(text, m.end()))
    }

    /// First capture group of every occurrence that survives the guard, in text order.
    pub fn captures<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.regex.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            if !self.guard_allows(text, whole.end()) {
                return None;
            }
            caps.get(1).map(|m| m.as_str())
        })
    }
}

#[derive(Debug, Clone)]
pub struct PatternSet {
    rules: Vec<PatternRule>,
}

impl PatternSet {
    fn compile(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs.iter().map(PatternRule::compile).collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// First rule, in table order, that matches anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.is_match(text))
    }

    pub fn any_match(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Number of rules that fire. A rule counts once however often it occurs.
    pub fn count_matches(&self, text: &str) -> usize {
        self.rules.iter().filter(|r| r.is_match(text)).count()
    }
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

const INFORMATIONAL: &[RuleSpec] = &[
    // expiry / validity
    rule(r"(?i)\bwill\s+expire\b", RuleCategory::Expiry),
    rule(r"(?i)\bexpir(?:es|ed|ing|y)\b", RuleCategory::Expiry),
    rule(r"(?i)\bvalid\s+(?:till|until|upto|up\s+to)\b", RuleCategory::Expiry),
    rule(r"(?i)\bvalidity\b", RuleCategory::Expiry),
    // confirmations of non-financial actions
    rule(
        r"(?i)\bsuccessfully\s+(?:registered|activated|updated|linked|de-?activated|verified|enabled|subscribed)\b",
        RuleCategory::Status,
    ),
    rule(
        r"(?i)\b(?:request|complaint|ticket)\s+(?:has\s+been|is)\s+(?:received|registered|raised|logged)\b",
        RuleCategory::Status,
    ),
    rule(r"(?i)\bhas\s+been\s+(?:dispatched|delivered|shipped)\b", RuleCategory::Status),
    // reminders
    rule(r"(?i)\breminder\b", RuleCategory::Reminder),
    rule(r"(?i)\bdon'?t\s+forget\b", RuleCategory::Reminder),
    rule(r"(?i)\brecharge\s+(?:now|before|today|immediately)\b", RuleCategory::Reminder),
    rule(r"(?i)\bkindly\s+(?:pay|recharge|clear)\b", RuleCategory::Reminder),
    // balance inquiries
    rule(r"(?i)\bbalance\s+(?:enquiry|inquiry|check)\b", RuleCategory::BalanceInquiry),
    rule(r"(?i)\byour\s+(?:a/?c|account)\s+balance\s+is\b", RuleCategory::BalanceInquiry),
    rule(r"(?i)\bmini\s+statement\b", RuleCategory::BalanceInquiry),
    // one-time codes
    rule(r"(?i)\bOTP\s+(?:is|for|to)\b", RuleCategory::Otp),
    rule(r"(?i)\bis\s+(?:your|the)\s+OTP\b", RuleCategory::Otp),
    rule(r"(?i)\bOTP\s*[:\-]?\s*\d{4,8}\b", RuleCategory::Otp),
    rule(r"(?i)\bone[\s\-]time\s+password\b", RuleCategory::Otp),
    rule(r"(?i)\b(?:verification|security|authentication)\s+code\b", RuleCategory::Otp),
    rule(r"(?i)\bdo\s+not\s+share\s+(?:this|it|the)\s+(?:otp|code)\b", RuleCategory::Otp),
    // promotions
    rule(r"(?i)\b(?:get|win|earn)\s+(?:up\s*to|upto|flat)\b", RuleCategory::Promotion),
    rule(r"(?i)\boffers?\b", RuleCategory::Promotion),
    rule(r"(?i)\bpre-?approved\b", RuleCategory::Promotion),
    rule(r"(?i)\b(?:apply|shop|book|upgrade)\s+now\b", RuleCategory::Promotion),
    rule(r"(?i)\blimited\s+(?:period|time)\b", RuleCategory::Promotion),
    rule(r"(?i)\b(?:discount|coupon|voucher\s+code)\b", RuleCategory::Promotion),
    // account lifecycle
    rule(
        r"(?i)\b(?:FD|RD|fixed\s+deposit|recurring\s+deposit)\b.{0,40}\bmatur",
        RuleCategory::AccountLifecycle,
    ),
    rule(r"(?i)\bmaturity\b", RuleCategory::AccountLifecycle),
    rule(
        r"(?i)\bcard\s+(?:has\s+been\s+|is\s+)?(?:activated|blocked|dispatched|issued|hotlisted)\b",
        RuleCategory::AccountLifecycle,
    ),
    rule(
        r"(?i)\baccount\s+(?:has\s+been|is)\s+(?:opened|closed|activated|frozen)\b",
        RuleCategory::AccountLifecycle,
    ),
    // money requested, not yet moved
    rule(r"(?i)\bhas\s+requested\b", RuleCategory::PaymentRequest),
    rule(r"(?i)\brequested\s+(?:money|payment|rs\.?|inr|₹)", RuleCategory::PaymentRequest),
    rule(r"(?i)\b(?:collect|payment|money)\s+request\b", RuleCategory::PaymentRequest),
    rule(r"(?i)\brequesting\b", RuleCategory::PaymentRequest),
    // bills not yet paid
    rule(r"(?i)\b(?:bill|payment|emi|amount)\s+(?:is\s+)?due\b", RuleCategory::BillDue),
    rule(r"(?i)\bdue\s+(?:date|on|by|today|tomorrow)\b", RuleCategory::BillDue),
    rule(r"(?i)\b(?:minimum|total)\s+(?:amount\s+)?due\b", RuleCategory::BillDue),
];

const EVIDENCE: &[RuleSpec] = &[
    rule(
        r"(?i)\b(?:debited|credited|withdrawn|deducted|spent|paid|received|transferred|sent|deposited)\b",
        RuleCategory::TransactionVerb,
    ),
    rule(r"(?i)\brefund(?:ed)?\b", RuleCategory::TransactionVerb),
    rule(r"(?i)\bcashback\b", RuleCategory::TransactionVerb),
    rule(r"(?i)\bpurchase\b", RuleCategory::TransactionVerb),
    rule(r"(?i)\bUPI\b", RuleCategory::TransferRail),
    rule(r"(?i)\b(?:NEFT|RTGS|IMPS)\b", RuleCategory::TransferRail),
    rule(
        r"(?i)\bcard\s+(?:ending(?:\s+(?:in|with))?|no\.?)?\s*[x*]*\d{4}\b",
        RuleCategory::CardReference,
    ),
];

/// Order matters: tagged amounts must beat the bare-number fallbacks.
const AMOUNT: &[RuleSpec] = &[
    rule(r"(?:₹|\$)\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)", RuleCategory::CurrencySymbol),
    rule(r"(?i)\b(?:Rs|INR|Rupees)\.?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)", RuleCategory::CurrencyWord),
    rule(
        r"(?i)\b(?:Txn\s+Amt|Amt|Amount|Txn)\s*(?:of|:|-)?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)",
        RuleCategory::AmountLabel,
    ),
    rule(r"\b([0-9][0-9,]*[0-9]\.[0-9]{1,2})\b", RuleCategory::DecimalFallback),
    rule(r"\b([0-9][0-9,]*[0-9])\b", RuleCategory::IntegerFallback),
];

const DEBIT: &[RuleSpec] = &[
    rule(r"(?i)\bdebited\b", RuleCategory::DebitEvidence),
    guarded(r"(?i)\bdebit\b", r"(?i)^\s*card\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bwithdraw(?:n|al)\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bspent\b", RuleCategory::DebitEvidence),
    guarded(r"(?i)\bpaid\b", r"(?i)^\s+to\s+you\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bsent\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bdeducted\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bcharged\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bpurchase\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\btransferred\s+to\b", RuleCategory::DebitEvidence),
    rule(r"(?i)\bpayment\s+(?:of|to|made)\b", RuleCategory::DebitEvidence),
];

const CREDIT: &[RuleSpec] = &[
    rule(r"(?i)\bcredited\b", RuleCategory::CreditEvidence),
    guarded(r"(?i)\bcredit\b", r"(?i)^\s*card\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\breceived\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\brefund(?:ed)?\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\bcashback\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\bdeposited\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\brevers(?:ed|al)\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\bpaid\s+to\s+you\b", RuleCategory::CreditEvidence),
    rule(r"(?i)\badded\s+to\b", RuleCategory::CreditEvidence),
];

const MERCHANT: &[RuleSpec] = &[
    rule(
        r"\b(?i:to|from|at)\s+([a-zA-Z0-9._\-]{2,}@[a-zA-Z]{2,})",
        RuleCategory::VirtualAddress,
    ),
    rule(
        r"\b(?i:at|to|from)\s+([A-Z][A-Za-z0-9&'.\- ]*?)(?:\s+(?i:on|via|ref|for|using|upi|avl|avbl|bal|info|txn|a/c)\b|\s*[.,;:(]\s|\s*[.,;]?\s*$)",
        RuleCategory::NamedCounterparty,
    ),
    rule(r"(?i)\bVPA\s*[:\-]\s*([^\s,;]+)", RuleCategory::VpaLabel),
    rule(r"(?i)\bUPI:\s*([^\s,;:]+)", RuleCategory::UpiLabel),
    rule(
        r"\b(?i:for|via)\s+([A-Z][A-Za-z0-9&'.\-]*(?:\s+[A-Z][A-Za-z0-9&'.\-]*)*)",
        RuleCategory::ForVia,
    ),
];

/// Sender-code fragments and the display name they map to. Checked in this
/// order by substring containment, so longer codes sit above their prefixes.
pub const INSTITUTIONS: &[(&str, &str)] = &[
    ("HDFCBK", "HDFC Bank"),
    ("HDFC", "HDFC Bank"),
    ("SBIINB", "State Bank of India"),
    ("SBICRD", "SBI Card"),
    ("SBI", "State Bank of India"),
    ("ICICIB", "ICICI Bank"),
    ("ICICI", "ICICI Bank"),
    ("AXISBK", "Axis Bank"),
    ("AXIS", "Axis Bank"),
    ("KOTAKB", "Kotak Mahindra Bank"),
    ("KOTAK", "Kotak Mahindra Bank"),
    ("YESBNK", "Yes Bank"),
    ("IDFCFB", "IDFC First Bank"),
    ("INDUSB", "IndusInd Bank"),
    ("PNBSMS", "Punjab National Bank"),
    ("CANBNK", "Canara Bank"),
    ("UNIONB", "Union Bank of India"),
    ("BOBTXN", "Bank of Baroda"),
    ("FEDBNK", "Federal Bank"),
    ("PAYTM", "Paytm"),
    ("PHONPE", "PhonePe"),
    ("PHONEPE", "PhonePe"),
    ("GPAY", "Google Pay"),
    ("AMAZON", "Amazon Pay"),
    ("MOBIKW", "MobiKwik"),
    ("JIOINF", "Jio"),
    ("JIO", "Jio"),
    ("AIRTEL", "Airtel"),
    ("BSNL", "BSNL"),
];

pub struct PatternLibrary {
    pub informational: PatternSet,
    pub evidence: PatternSet,
    pub amount: PatternSet,
    pub debit: PatternSet,
    pub credit: PatternSet,
    pub merchant: PatternSet,
}

impl PatternLibrary {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            informational: PatternSet::compile(INFORMATIONAL)?,
            evidence: PatternSet::compile(EVIDENCE)?,
            amount: PatternSet::compile(AMOUNT)?,
            debit: PatternSet::compile(DEBIT)?,
            credit: PatternSet::compile(CREDIT)?,
            merchant: PatternSet::compile(MERCHANT)?,
        })
    }
}

static LIBRARY: Lazy<PatternLibrary> =
    Lazy::new(|| PatternLibrary::compile().expect("built-in pattern tables must compile"));

/// Process-wide tables, compiled on first use and never mutated afterwards.
pub fn library() -> &'static PatternLibrary {
    &LIBRARY
}
