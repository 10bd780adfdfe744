//! Predict command: apply a server prediction to a recorded minute.

use std::io::Write;

use anyhow::{Context, Result};

use minlog_db::Database;

use super::util::{format_granule, parse_granule};

pub fn run<W: Write>(writer: &mut W, db: &Database, timestamp: &str, label: &str) -> Result<()> {
    let granule = parse_granule(timestamp)?;
    let mut record = db
        .fetch_record(granule)?
        .with_context(|| format!("no record for minute {}", format_granule(granule)))?;

    db.set_server_prediction(&mut record, Some(label.to_string()))?;

    writeln!(
        writer,
        "Predicted {}: {label}",
        format_granule(record.timestamp)
    )?;
    Ok(())
}
