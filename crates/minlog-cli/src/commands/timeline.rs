//! Timeline command: continuous activities over a time range.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use minlog_core::ContinuousSegment;
use minlog_db::Database;

use super::util::{format_granule, parse_granule};

/// How to group the records in the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Label-aware merge into continuous activities.
    Merged,
    /// The whole range as one activity, gaps and label changes ignored.
    Single,
    /// One entry per recorded minute.
    PerMinute,
}

/// One rendered segment, shared by text and JSON output.
#[derive(Debug, Serialize)]
struct SegmentView {
    start: String,
    end: String,
    minutes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    secondary: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    moods: Vec<String>,
}

impl SegmentView {
    fn from_segment(segment: &ContinuousSegment) -> Self {
        Self {
            start: format_granule(segment.start_time()),
            end: format_granule(segment.end_time()),
            minutes: segment.minutes(),
            main_label: segment.main_label().map(str::to_string),
            secondary: segment.secondary_labels().to_vec(),
            moods: segment.mood_labels().to_vec(),
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    from: &str,
    to: &str,
    grouping: Grouping,
    json: bool,
) -> Result<()> {
    let from = parse_granule(from)?;
    let to = parse_granule(to)?;

    let segments = match grouping {
        Grouping::Merged => db.continuous_segments_in_range(from, to)?,
        Grouping::Single => db
            .single_segment_in_range(from, to)?
            .into_iter()
            .collect(),
        Grouping::PerMinute => db
            .continuous_segments_in_range(from, to)?
            .iter()
            .flat_map(ContinuousSegment::split_per_minute)
            .collect(),
    };
    let views: Vec<SegmentView> = segments.iter().map(SegmentView::from_segment).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&views)?)?;
        return Ok(());
    }

    if views.is_empty() {
        writeln!(writer, "No records in range.")?;
        return Ok(());
    }
    for view in views {
        let label = view.main_label.as_deref().unwrap_or("(unlabeled)");
        write!(
            writer,
            "{} .. {}  {label}  ({} min)",
            view.start, view.end, view.minutes
        )?;
        if !view.secondary.is_empty() {
            write!(writer, "  +{}", view.secondary.join(",+"))?;
        }
        if !view.moods.is_empty() {
            write!(writer, "  ~{}", view.moods.join(",~"))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
