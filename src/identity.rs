use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::{library, INSTITUTIONS};

/// Length cap for body-derived descriptions, in characters.
pub const SNIPPET_CHARS: usize = 100;
const MIN_MERCHANT_CHARS: usize = 3;

static ROUTING_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}-").expect("routing prefix pattern must compile"));

/// Display name for the bank, wallet or telecom behind a sender code.
///
/// Known codes are matched by substring (`VM-HDFCBK` -> `HDFC Bank`). Unknown
/// senders come back uppercased with any two-letter routing prefix removed.
pub fn extract_institution(sender: &str) -> String {
    let code = sender.trim().to_uppercase();
    if let Some((_, name)) = INSTITUTIONS.iter().find(|(fragment, _)| code.contains(fragment)) {
        return (*name).to_string();
    }
    ROUTING_PREFIX.replace(&code, "").into_owned()
}

/// Counterparty named in the body, or `None` when nothing usable is found.
///
/// `None` is not an error: callers fall back to [`description_snippet`].
pub fn extract_merchant(body: &str) -> Option<String> {
    library().merchant.rules().iter().find_map(|r| {
        r.captures(body)
            .map(clean_merchant)
            .find(|name| name.chars().count() >= MIN_MERCHANT_CHARS)
    })
}

fn clean_merchant(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | '-' | ':' | ';'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Body with whitespace collapsed, cut to [`SNIPPET_CHARS`] on a char boundary.
pub fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}

/// Merchant guess when there is one, otherwise the body snippet.
pub fn description_snippet(merchant: Option<&str>, body: &str) -> String {
    match merchant {
        Some(name) => name.to_string(),
        None => body_snippet(body),
    }
}
