//! Hook for an optional second opinion (a cloud or on-device model, a script, ...).
//!
//! The classifier never depends on a verifier being present. When one is
//! configured its answer is advisory: a timeout or any error is logged and the
//! local result stands.
//!
//! Text-producing verifiers answer with a single pipe-separated line:
//!
//! ```text
//! YES|DEBIT|500.00|card purchase
//! NO|NONE|-|balance alert
//! ```
//!
//! Field two is `DEBIT`, `CREDIT` or `NONE`; field three is a decimal or `-`;
//! the reason is optional. Anything else is rejected by [`parse_verdict`].

use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::amount::parse_amount;
use crate::models::Direction;

/// Default budget for one verification call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_transaction: bool,
    pub direction: Option<Direction>,
    /// Advisory only. The classifier keeps its locally extracted amount.
    pub amount: Option<Decimal>,
    pub reason: String,
}

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, text: &str) -> anyhow::Result<Verdict>;

    fn name(&self) -> &str {
        "verifier"
    }
}

pub fn parse_verdict(response: &str) -> anyhow::Result<Verdict> {
    let line = response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("empty verifier response"))?;
    let mut fields = line.splitn(4, '|').map(str::trim);

    let is_transaction = match fields.next().map(str::to_ascii_uppercase).as_deref() {
        Some("YES") => true,
        Some("NO") => false,
        other => bail!("expected YES or NO, got {other:?}"),
    };

    let direction = match fields.next().map(str::to_ascii_uppercase).as_deref() {
        Some("DEBIT") => Some(Direction::Debit),
        Some("CREDIT") => Some(Direction::Credit),
        Some("NONE") => None,
        other => bail!("expected DEBIT, CREDIT or NONE, got {other:?}"),
    };

    let amount = match fields.next() {
        Some("-") => None,
        Some(raw) => Some(parse_amount(raw).ok_or_else(|| anyhow!("invalid amount {raw:?}"))?),
        None => bail!("missing amount field"),
    };

    let reason = match fields.next().filter(|r| !r.is_empty()) {
        Some(r) => r.to_string(),
        None if is_transaction => "confirmed".to_string(),
        None => "not a transaction".to_string(),
    };

    Ok(Verdict {
        is_transaction,
        direction,
        amount,
        reason,
    })
}

/// Run `verifier` under `timeout`. `None` means "unavailable": fall back to local rules.
pub async fn verify_with_timeout(verifier: &dyn Verifier, text: &str, timeout: Duration) -> Option<Verdict> {
    match tokio::time::timeout(timeout, verifier.verify(text)).await {
        Ok(Ok(verdict)) => Some(verdict),
        Ok(Err(e)) => {
            warn!(verifier = verifier.name(), error = %e, "verifier failed, keeping local result");
            None
        }
        Err(_) => {
            warn!(
                verifier = verifier.name(),
                timeout_ms = timeout.as_millis() as u64,
                "verifier timed out, keeping local result"
            );
            None
        }
    }
}

/// Verifier backed by a shell command: message text on stdin, verdict line on stdout.
#[cfg(feature = "command-verifier")]
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    command: String,
}

#[cfg(feature = "command-verifier")]
impl CommandVerifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

#[cfg(feature = "command-verifier")]
#[async_trait]
impl Verifier for CommandVerifier {
    async fn verify(&self, text: &str) -> anyhow::Result<Verdict> {
        use std::process::Stdio;

        use anyhow::Context;
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start verifier command `{}`", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            bail!("verifier command exited with {}", output.status);
        }
        parse_verdict(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        &self.command
    }
}
