use colored::Colorize;
use comfy_table::{Cell, Table};

use smsledger::error::Result;
use smsledger::fmt::money;
use smsledger::models::{ParseMode, ParseOutcome, RawMessage};
use smsledger::parser::Classifier;

use super::direction_cell;

/// 2024-01-05 09:00 UTC, stepped by a minute per sample.
const BASE_TIME: i64 = 1_704_445_200_000;

const SAMPLES: &[(&str, &str)] = &[
    (
        "VM-HDFCBK",
        "Rs.500.00 debited from A/c XX1234 on 05-01-24 at SWIGGY. Avl Bal Rs 4500.00",
    ),
    ("HDFCBK", "Rs 10,000 credited to your A/c XX1234 via NEFT from JOHN DOE"),
    ("JX-PAYTM", "Rs 249.00 paid to zomato@hdfcbank via UPI Ref 412345678901"),
    ("AD-AMAZON", "INR 1,250.00 refunded to your A/c XX9876 by AMAZON. "),
    ("JIO", "Your Jio plan will expire today. Recharge before due date."),
    ("AX-SBIINB", "OTP is 834521 for your transaction. Do not share."),
    ("VM-SBIINB", "Dear Customer, your A/c XX1234 has been debited."),
    ("VK-ICICIB", "Your salary slip for March is now available on the portal."),
    ("BZ-AXISBK", "Rs 250,000,000 credited to A/c XX1111"),
];

pub fn sample_messages() -> Vec<RawMessage> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (sender, body))| RawMessage::new((i + 1).to_string(), *sender, *body, BASE_TIME + i as i64 * 60_000))
        .collect()
}

pub fn run() -> Result<()> {
    let messages = sample_messages();
    let outcomes = Classifier::new(ParseMode::Strict).classify_all(&messages);

    let mut table = Table::new();
    table.set_header(vec!["Sender", "Outcome", "Direction", "Amount", "Detail"]);
    for (msg, outcome) in messages.iter().zip(&outcomes) {
        match outcome {
            ParseOutcome::Parsed(txn) => table.add_row(vec![
                Cell::new(&msg.sender),
                Cell::new("parsed".green()),
                direction_cell(txn.direction),
                Cell::new(money(txn.amount)),
                Cell::new(format!("{} / {}", txn.institution, txn.description_snippet)),
            ]),
            ParseOutcome::Rejected { reason } => table.add_row(vec![
                Cell::new(&msg.sender),
                Cell::new("rejected".yellow()),
                Cell::new(""),
                Cell::new(""),
                Cell::new(reason),
            ]),
        };
    }
    println!("Demo messages (strict mode)\n{table}");

    let parsed = outcomes.iter().filter(|o| o.is_parsed()).count();
    println!("{} parsed, {} rejected", parsed, outcomes.len() - parsed);
    Ok(())
}
