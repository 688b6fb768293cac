use colored::Colorize;

use smsledger::db::{get_connection, last_import_date, ledger_totals};
use smsledger::error::Result;
use smsledger::fmt::{format_bytes, money};
use smsledger::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Mode:       {}", settings.mode.as_str());
    println!(
        "Verifier:   {}",
        settings.verifier_command.as_deref().unwrap_or("(not set)")
    );
    println!("Timeout:    {} ms", settings.verifier_timeout_ms);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let totals = ledger_totals(&conn)?;
        let last = last_import_date(&conn)?;

        println!();
        println!("Imports:       {}", totals.imports);
        println!("Last import:   {}", last.as_deref().unwrap_or("(never)"));
        println!("Transactions:  {}", totals.transactions);
        println!("Debits:        {}", money(totals.debit).red());
        println!("Credits:       {}", money(totals.credit).green());
        println!("Net:           {}", money(totals.net()).bold());
    } else {
        println!();
        println!("Database not found. Run `smsledger init` to set up.");
    }

    Ok(())
}
