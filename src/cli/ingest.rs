use std::path::PathBuf;

use smsledger::db::{get_connection, init_db, is_duplicate_file, store_outcomes};
use smsledger::error::Result;
use smsledger::importer::load_messages;
use smsledger::settings::load_settings;

use super::{build_classifier, classify_batch, ModeArgs};

const DUPLICATE_FILE: &str = "This file has already been ingested (duplicate checksum).";

pub fn run(file: &str, mode: &ModeArgs) -> Result<()> {
    let file_path = PathBuf::from(file);
    let settings = load_settings();
    let mut conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    let loaded = load_messages(&file_path)?;
    if is_duplicate_file(&conn, &loaded.checksum)? {
        println!("{DUPLICATE_FILE}");
        return Ok(());
    }

    let classifier = build_classifier(&settings, mode)?;
    let outcomes = classify_batch(&classifier, &loaded.messages)?;

    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    let result = store_outcomes(&mut conn, &filename, &loaded.checksum, &outcomes)?;

    if result.duplicate_file {
        println!("{DUPLICATE_FILE}");
        return Ok(());
    }

    println!(
        "{} stored, {} skipped (duplicates), {} rejected",
        result.inserted, result.duplicates, result.rejected
    );
    Ok(())
}
