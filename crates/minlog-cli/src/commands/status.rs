//! Status command: store location and recording summary.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use minlog_core::TimeGranule;
use minlog_db::Database;

use super::util::format_granule;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let records = db.records_in_range(TimeGranule::MIN, TimeGranule::now())?;

    writeln!(writer, "Minute activity log status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        writeln!(writer, "No minutes recorded.")?;
        return Ok(());
    };
    writeln!(writer, "Recorded minutes: {}", records.len())?;
    writeln!(
        writer,
        "Span: {} .. {}",
        format_granule(first.timestamp),
        format_granule(last.timestamp)
    )?;

    match db.latest_user_labeled(None)? {
        Some(record) => writeln!(
            writer,
            "Latest user-labeled minute: {} ({})",
            format_granule(record.timestamp),
            record.main_label().unwrap_or("(no main label)")
        )?,
        None => writeln!(writer, "No user-labeled minutes yet.")?,
    }
    Ok(())
}
