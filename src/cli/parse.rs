use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use smsledger::error::Result;
use smsledger::fmt::{money, timestamp};
use smsledger::importer::load_messages;
use smsledger::models::{ParseOutcome, RawMessage};
use smsledger::settings::load_settings;

use super::{build_classifier, classify_batch, direction_cell, ModeArgs};

#[derive(Serialize)]
struct OutcomeRow<'a> {
    id: &'a str,
    sender: &'a str,
    #[serde(flatten)]
    outcome: &'a ParseOutcome,
}

pub fn run(file: &str, mode: &ModeArgs, json: bool, all: bool) -> Result<()> {
    let loaded = load_messages(&PathBuf::from(file))?;
    let classifier = build_classifier(&load_settings(), mode)?;
    let outcomes = classify_batch(&classifier, &loaded.messages)?;

    let rows: Vec<(&RawMessage, &ParseOutcome)> = loaded
        .messages
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| all || outcome.is_parsed())
        .collect();

    if json {
        let out: Vec<OutcomeRow> = rows
            .iter()
            .map(|(msg, outcome)| OutcomeRow {
                id: &msg.id,
                sender: &msg.sender,
                outcome,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Direction", "Amount", "Institution", "Description"]);
    for (msg, outcome) in &rows {
        match outcome {
            ParseOutcome::Parsed(txn) => table.add_row(vec![
                Cell::new(&msg.id),
                Cell::new(timestamp(txn.occurred_at)),
                direction_cell(txn.direction),
                Cell::new(money(txn.amount)),
                Cell::new(&txn.institution),
                Cell::new(&txn.description_snippet),
            ]),
            ParseOutcome::Rejected { reason } => table.add_row(vec![
                Cell::new(&msg.id),
                Cell::new(timestamp(msg.received_at)),
                Cell::new("rejected".dimmed()),
                Cell::new(""),
                Cell::new(""),
                Cell::new(reason),
            ]),
        };
    }
    println!("{table}");

    let parsed = outcomes.iter().filter(|o| o.is_parsed()).count();
    println!(
        "{} parsed, {} rejected ({} mode)",
        parsed,
        outcomes.len() - parsed,
        classifier.mode().as_str()
    );
    Ok(())
}
