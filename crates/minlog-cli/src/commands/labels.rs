//! Labels command: rank labels by frequency.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use minlog_core::LabelKind;
use minlog_db::Database;

use super::util::parse_granule;

#[derive(Debug, Serialize)]
struct LabelCount {
    label: String,
    count: usize,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    kind: LabelKind,
    since: Option<&str>,
    json: bool,
) -> Result<()> {
    let since = since.map(parse_granule).transpose()?;
    let ranked: Vec<LabelCount> = db
        .ranked_label_counts(since, kind)?
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&ranked)?)?;
        return Ok(());
    }

    if ranked.is_empty() {
        writeln!(writer, "No {kind} labels recorded.")?;
        return Ok(());
    }
    for entry in ranked {
        writeln!(writer, "{:>5}  {}", entry.count, entry.label)?;
    }
    Ok(())
}
