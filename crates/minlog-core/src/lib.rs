//! Core domain logic for the minute activity log.
//!
//! This crate contains the fundamental types and logic for:
//! - Minute records: one row of labeled activity per minute
//! - Segments: label-aware merging of consecutive minutes
//! - Frequency: counting and ranking labels across records

pub mod frequency;
pub mod granule;
pub mod labels;
pub mod record;
pub mod segment;

pub use frequency::{label_counts, ranked_label_counts, ranked_labels};
pub use granule::{GRANULE_SECS, TimeGranule};
pub use labels::{LabelError, LabelKind, LabelSource, join_labels, split_labels};
pub use record::ActivityRecord;
pub use segment::{ContinuousSegment, merge_continuous};
