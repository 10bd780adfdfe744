//! Label command: apply a user labeling to a recorded minute.

use std::io::Write;

use anyhow::{Context, Result};

use minlog_core::LabelSource;
use minlog_db::{Database, LabelUpdate};

use super::util::{format_granule, parse_granule};

/// What the user asked to change.
#[derive(Debug, Clone)]
pub struct LabelArgs {
    pub timestamp: String,
    pub main: Option<String>,
    pub secondary: Vec<String>,
    pub mood: Vec<String>,
    pub keep_server_prediction: bool,
    pub no_feedback: bool,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, args: LabelArgs) -> Result<()> {
    let granule = parse_granule(&args.timestamp)?;
    let mut record = db
        .fetch_record(granule)?
        .with_context(|| format!("no record for minute {}", format_granule(granule)))?;

    if args.keep_server_prediction && !args.no_feedback {
        db.set_user_labels(
            &mut record,
            LabelSource::UserCorrected,
            args.main,
            args.secondary,
            args.mood,
        )?;
    } else {
        let server_main = if args.keep_server_prediction {
            record.server_main.clone()
        } else {
            None
        };
        db.set_values(
            &mut record,
            LabelUpdate {
                source: LabelSource::UserCorrected,
                server_main,
                user_main: args.main,
                secondary: args.secondary,
                moods: args.mood,
            },
            !args.no_feedback,
        )?;
    }

    writeln!(
        writer,
        "Labeled {}: {}",
        format_granule(record.timestamp),
        record.main_label().unwrap_or("(no main label)")
    )?;
    Ok(())
}
