//! Continuous activity segments: consecutive minutes with matching labels.

use std::mem;

use crate::granule::TimeGranule;
use crate::record::ActivityRecord;

/// A non-empty run of minute records presented as one activity.
///
/// Emptiness is ruled out at construction, so the start and end accessors
/// are infallible. Label coherence depends on how the segment was built:
/// [`merge_continuous`] breaks runs on label changes, while
/// [`ContinuousSegment::new`] accepts any ordered records and the label
/// accessors then reflect the first minute only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuousSegment {
    records: Vec<ActivityRecord>,
}

impl ContinuousSegment {
    /// Wraps ordered records as a single segment regardless of gaps or
    /// label changes. Returns `None` when there are no records.
    #[must_use]
    pub fn new(records: Vec<ActivityRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    /// Minute of the first record.
    #[must_use]
    pub fn start_time(&self) -> TimeGranule {
        self.records[0].timestamp
    }

    /// Minute of the last record.
    #[must_use]
    pub fn end_time(&self) -> TimeGranule {
        self.records[self.records.len() - 1].timestamp
    }

    /// Effective main label, read from the first minute.
    #[must_use]
    pub fn main_label(&self) -> Option<&str> {
        self.records[0].main_label()
    }

    /// Secondary labels of the first minute.
    #[must_use]
    pub fn secondary_labels(&self) -> &[String] {
        &self.records[0].secondary
    }

    /// Mood labels of the first minute.
    #[must_use]
    pub fn mood_labels(&self) -> &[String] {
        &self.records[0].moods
    }

    /// The individual minute records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Number of minute records in the segment.
    #[must_use]
    pub fn minutes(&self) -> usize {
        self.records.len()
    }

    /// Consumes the segment, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<ActivityRecord> {
        self.records
    }

    /// Splits into one single-minute segment per record, the inverse of
    /// merging.
    #[must_use]
    pub fn split_per_minute(&self) -> Vec<Self> {
        self.records
            .iter()
            .cloned()
            .map(|record| Self {
                records: vec![record],
            })
            .collect()
    }
}

/// Folds ordered minute records into label-coherent continuous segments.
///
/// A record extends the current segment only when it falls exactly one
/// minute after its predecessor and carries equivalent labels; any gap,
/// overlap or label change starts a new segment. Every record lands in
/// exactly one segment and input order is preserved.
#[must_use]
pub fn merge_continuous(records: Vec<ActivityRecord>) -> Vec<ContinuousSegment> {
    let mut segments = Vec::new();
    let mut run: Vec<ActivityRecord> = Vec::new();

    for record in records {
        let extends = run.last().is_some_and(|prev| {
            record.timestamp.is_minute_after(prev.timestamp) && record.labels_equivalent(prev)
        });
        if !extends && !run.is_empty() {
            segments.push(ContinuousSegment {
                records: mem::take(&mut run),
            });
        }
        run.push(record);
    }
    if !run.is_empty() {
        segments.push(ContinuousSegment { records: run });
    }
    segments
}
