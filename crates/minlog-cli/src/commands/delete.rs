//! Delete command: remove the record for a minute.

use std::io::Write;

use anyhow::Result;

use minlog_db::Database;

use super::util::{format_granule, parse_granule};

pub fn run<W: Write>(writer: &mut W, db: &Database, timestamp: &str) -> Result<()> {
    let granule = parse_granule(timestamp)?;
    if db.delete_record(granule)? {
        writeln!(writer, "Deleted record for {}", format_granule(granule))?;
    } else {
        writeln!(writer, "No record for {}", format_granule(granule))?;
    }
    Ok(())
}
