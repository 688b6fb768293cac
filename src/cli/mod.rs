pub mod demo;
pub mod ingest;
pub mod init;
pub mod list;
pub mod parse;
pub mod status;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use comfy_table::Cell;

use smsledger::error::Result;
use smsledger::models::{Direction, ParseMode, ParseOutcome, RawMessage};
use smsledger::parser::Classifier;
use smsledger::settings::Settings;

#[derive(Parser)]
#[command(name = "smsledger", about = "Turn bank and wallet SMS alerts into a deduplicated ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up smsledger: choose a data directory and initialize the database.
    Init {
        /// Path for smsledger data (default: ~/Documents/smsledger)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Classify a message export and print the results without storing them.
    Parse {
        /// Path to a JSON or CSV message export
        file: String,
        #[command(flatten)]
        mode: ModeArgs,
        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
        /// Include rejected messages
        #[arg(long)]
        all: bool,
    },
    /// Classify a message export and store new transactions in the ledger.
    Ingest {
        /// Path to a JSON or CSV message export
        file: String,
        #[command(flatten)]
        mode: ModeArgs,
    },
    /// List stored transactions, newest first.
    List {
        /// Maximum number of rows
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Classify a built-in set of sample messages.
    Demo,
    /// Show settings and ledger totals.
    Status,
}

/// Flags shared by every command that classifies messages.
#[derive(Args, Debug, Clone, Default)]
pub struct ModeArgs {
    /// Skip the strict evidence check; the verifier, if any, has the final say
    #[arg(long)]
    pub hybrid: bool,
    /// Shell command to use as verifier (implies --hybrid)
    #[arg(long = "verifier-cmd")]
    pub verifier_cmd: Option<String>,
    /// Verifier timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

/// Command-line flags take precedence over settings.json.
pub(crate) fn build_classifier(settings: &Settings, args: &ModeArgs) -> Result<Classifier> {
    let mode = if args.hybrid || args.verifier_cmd.is_some() {
        ParseMode::Hybrid
    } else {
        settings.mode
    };
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.verifier_timeout());
    let classifier = Classifier::new(mode).with_timeout(timeout);

    let command = args.verifier_cmd.as_ref().or(settings.verifier_command.as_ref());
    match (mode, command) {
        (ParseMode::Hybrid, Some(command)) => attach_command_verifier(classifier, command),
        _ => Ok(classifier),
    }
}

#[cfg(feature = "command-verifier")]
fn attach_command_verifier(classifier: Classifier, command: &str) -> Result<Classifier> {
    use std::sync::Arc;

    use smsledger::verifier::CommandVerifier;

    Ok(classifier.with_verifier(Arc::new(CommandVerifier::new(command))))
}

#[cfg(not(feature = "command-verifier"))]
fn attach_command_verifier(_classifier: Classifier, _command: &str) -> Result<Classifier> {
    Err(smsledger::error::LedgerError::Other(
        "this build has no command verifier support".to_string(),
    ))
}

/// Classify a batch, going through the verifier only when one can be consulted.
pub(crate) fn classify_batch(classifier: &Classifier, messages: &[RawMessage]) -> Result<Vec<ParseOutcome>> {
    if classifier.mode() != ParseMode::Hybrid || !classifier.has_verifier() {
        return Ok(classifier.classify_all(messages));
    }
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(classifier.classify_all_verified(messages)))
}

pub(crate) fn direction_cell(direction: Direction) -> Cell {
    match direction {
        Direction::Debit => Cell::new(direction.as_str().red()),
        Direction::Credit => Cell::new(direction.as_str().green()),
    }
}
