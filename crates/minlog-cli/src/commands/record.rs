//! Record command: start recording a minute.

use std::io::Write;

use anyhow::Result;

use minlog_core::TimeGranule;
use minlog_db::{Database, DbError};

use super::util::{format_granule, parse_granule};

/// Creates the blank record for a minute, defaulting to the current one.
pub fn run<W: Write>(writer: &mut W, db: &Database, at: Option<&str>) -> Result<()> {
    let granule = match at {
        Some(s) => parse_granule(s)?,
        None => TimeGranule::now(),
    }
    .floor_to_minute();

    match db.create_record(granule) {
        Ok(record) => {
            writeln!(
                writer,
                "Recording started for {}",
                format_granule(record.timestamp)
            )?;
            Ok(())
        }
        Err(DbError::RecordExists(timestamp)) => {
            anyhow::bail!(
                "minute {} is already recorded; label it or delete it first",
                format_granule(timestamp)
            )
        }
        Err(err) => Err(err.into()),
    }
}
