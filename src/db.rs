use std::path::Path;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::amount::canonical_amount;
use crate::error::Result;
use crate::models::{Direction, ParseOutcome, ParsedTransaction};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    message_count INTEGER,
    parsed_count INTEGER,
    checksum TEXT UNIQUE
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    dedup_key TEXT NOT NULL UNIQUE,
    amount TEXT NOT NULL,
    direction TEXT NOT NULL,
    institution TEXT NOT NULL,
    merchant TEXT,
    description TEXT NOT NULL,
    occurred_at INTEGER NOT NULL,
    raw_text TEXT NOT NULL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at ON transactions(occurred_at);
";

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let key = value.as_str()?;
        Direction::from_key(key).ok_or_else(|| FromSqlError::Other(format!("unknown direction {key:?}").into()))
    }
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert unless the dedup key is already stored. Returns whether a row was written.
pub fn insert_transaction(conn: &Connection, txn: &ParsedTransaction, import_id: Option<i64>) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO transactions \
         (dedup_key, amount, direction, institution, merchant, description, occurred_at, raw_text, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            txn.dedup_key,
            canonical_amount(txn.amount),
            txn.direction,
            txn.institution,
            txn.merchant_guess,
            txn.description_snippet,
            txn.occurred_at,
            txn.raw_text,
            import_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn is_duplicate_file(conn: &Connection, checksum: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM imports WHERE checksum = ?1")?;
    Ok(stmt.exists([checksum])?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreResult {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub duplicate_file: bool,
}

/// Persist the parsed outcomes of one message file inside a single transaction.
///
/// A file whose checksum was already recorded is skipped entirely.
pub fn store_outcomes(
    conn: &mut Connection,
    filename: &str,
    checksum: &str,
    outcomes: &[ParseOutcome],
) -> Result<StoreResult> {
    if is_duplicate_file(conn, checksum)? {
        return Ok(StoreResult {
            duplicate_file: true,
            ..StoreResult::default()
        });
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, message_count, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![filename, outcomes.len() as i64, checksum],
    )?;
    let import_id = tx.last_insert_rowid();

    let mut result = StoreResult::default();
    for outcome in outcomes {
        match outcome.transaction() {
            Some(txn) => {
                if insert_transaction(&tx, txn, Some(import_id))? {
                    result.inserted += 1;
                } else {
                    result.duplicates += 1;
                }
            }
            None => result.rejected += 1,
        }
    }

    tx.execute(
        "UPDATE imports SET parsed_count = ?1 WHERE id = ?2",
        rusqlite::params![result.inserted as i64, import_id],
    )?;
    tx.commit()?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTransaction {
    pub id: i64,
    pub dedup_key: String,
    pub amount: Decimal,
    pub direction: Direction,
    pub institution: String,
    pub merchant: Option<String>,
    pub description: String,
    pub occurred_at: i64,
}

/// Most recent first.
pub fn list_transactions(conn: &Connection, limit: usize) -> Result<Vec<StoredTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, dedup_key, amount, direction, institution, merchant, description, occurred_at \
         FROM transactions ORDER BY occurred_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(StoredTransaction {
                id: row.get(0)?,
                dedup_key: row.get(1)?,
                amount: decimal_column(row, 2)?,
                direction: row.get(3)?,
                institution: row.get(4)?,
                merchant: row.get(5)?,
                description: row.get(6)?,
                occurred_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub transactions: usize,
    pub imports: usize,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl LedgerTotals {
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

pub fn ledger_totals(conn: &Connection) -> Result<LedgerTotals> {
    let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;
    let mut totals = LedgerTotals {
        imports: imports as usize,
        ..LedgerTotals::default()
    };

    // amounts are stored as canonical decimal text, so sum them here rather than in SQL
    let mut stmt = conn.prepare("SELECT amount, direction FROM transactions")?;
    let rows = stmt.query_map([], |row| Ok((decimal_column(row, 0)?, row.get::<_, Direction>(1)?)))?;
    for row in rows {
        let (amount, direction) = row?;
        totals.transactions += 1;
        match direction {
            Direction::Debit => totals.debit += amount,
            Direction::Credit => totals.credit += amount,
        }
    }
    Ok(totals)
}

pub fn last_import_date(conn: &Connection) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT max(import_date) FROM imports", [], |r| r.get::<_, Option<String>>(0))
        .optional()?
        .flatten())
}
