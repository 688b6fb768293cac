use comfy_table::{Cell, Table};

use smsledger::db::{get_connection, list_transactions};
use smsledger::error::Result;
use smsledger::fmt::{money, timestamp};
use smsledger::settings::load_settings;

use super::direction_cell;

pub fn run(limit: usize) -> Result<()> {
    let db_path = load_settings().db_path();
    if !db_path.exists() {
        println!("Database not found. Run `smsledger init` to set up.");
        return Ok(());
    }
    let conn = get_connection(&db_path)?;
    let rows = list_transactions(&conn, limit)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Direction", "Amount", "Institution", "Description"]);
    for txn in rows {
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(timestamp(txn.occurred_at)),
            direction_cell(txn.direction),
            Cell::new(money(txn.amount)),
            Cell::new(txn.institution),
            Cell::new(txn.description),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}
