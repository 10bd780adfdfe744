//! Label frequency counting and ranking.

use std::collections::HashMap;

use crate::labels::LabelKind;
use crate::record::ActivityRecord;

/// Counts how often each label of the given kind appears across records.
///
/// Main labels count only user corrections; a server prediction the user
/// never confirmed says nothing about what they actually did. Secondary
/// and mood labels count every occurrence.
#[must_use]
pub fn label_counts(records: &[ActivityRecord], kind: LabelKind) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        match kind {
            LabelKind::Main => {
                if let Some(label) = record.user_main.as_deref() {
                    *counts.entry(label.to_string()).or_insert(0) += 1;
                }
            }
            LabelKind::Secondary => {
                for label in &record.secondary {
                    *counts.entry(label.clone()).or_insert(0) += 1;
                }
            }
            LabelKind::Mood => {
                for label in &record.moods {
                    *counts.entry(label.clone()).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

/// Labels with their counts, most frequent first.
///
/// Equal counts rank alphabetically so the ordering is deterministic.
#[must_use]
pub fn ranked_label_counts(records: &[ActivityRecord], kind: LabelKind) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = label_counts(records, kind).into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tracing::debug!(kind = %kind, labels = ranked.len(), "ranked label frequencies");
    ranked
}

/// Just the labels of [`ranked_label_counts`], most frequent first.
#[must_use]
pub fn ranked_labels(records: &[ActivityRecord], kind: LabelKind) -> Vec<String> {
    ranked_label_counts(records, kind)
        .into_iter()
        .map(|(label, _)| label)
        .collect()
}
