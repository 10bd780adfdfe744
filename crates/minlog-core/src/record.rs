//! Per-minute activity records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::granule::TimeGranule;
use crate::labels::LabelSource;

/// One minute of recorded user activity and its labels.
///
/// The timestamp is the record's identity and never changes; everything
/// else is mutable label state. A server prediction and a user correction
/// can coexist, with the correction taking precedence wherever an
/// effective main label is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Minute this record describes.
    pub timestamp: TimeGranule,

    /// Who last supplied the main label.
    #[serde(default)]
    pub label_source: LabelSource,

    /// Main activity predicted by the server, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_main: Option<String>,

    /// Main activity supplied by the user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_main: Option<String>,

    /// Secondary activity labels. Order carries no meaning.
    #[serde(default)]
    pub secondary: Vec<String>,

    /// Mood labels. Order carries no meaning.
    #[serde(default)]
    pub moods: Vec<String>,
}

impl ActivityRecord {
    /// Creates the blank record for a minute: default source, no labels.
    #[must_use]
    pub const fn new(timestamp: TimeGranule) -> Self {
        Self {
            timestamp,
            label_source: LabelSource::Default,
            server_main: None,
            user_main: None,
            secondary: Vec::new(),
            moods: Vec::new(),
        }
    }

    /// The effective main label: the user's word when present, otherwise
    /// the server prediction.
    #[must_use]
    pub fn main_label(&self) -> Option<&str> {
        self.user_main.as_deref().or(self.server_main.as_deref())
    }

    /// Whether the user has supplied any label at all on this record.
    #[must_use]
    pub fn has_user_labels(&self) -> bool {
        self.user_main.is_some() || !self.secondary.is_empty() || !self.moods.is_empty()
    }

    /// Whether two records would read the same in the log: equal effective
    /// main labels plus the same secondary and mood sets, ignoring order.
    ///
    /// Label provenance is deliberately not compared; a prediction the
    /// user confirmed verbatim reads the same as the prediction itself.
    #[must_use]
    pub fn labels_equivalent(&self, other: &Self) -> bool {
        self.main_label() == other.main_label()
            && same_label_set(&self.secondary, &other.secondary)
            && same_label_set(&self.moods, &other.moods)
    }
}

/// Order-insensitive equality for label sets. Duplicate labels are not
/// expected within one set.
fn same_label_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(secs: i64) -> ActivityRecord {
        ActivityRecord::new(TimeGranule::from_secs(secs))
    }

    #[test]
    fn new_record_is_blank() {
        let rec = record(600);
        assert_eq!(rec.label_source, LabelSource::Default);
        assert_eq!(rec.server_main, None);
        assert_eq!(rec.user_main, None);
        assert!(rec.secondary.is_empty());
        assert!(rec.moods.is_empty());
        assert!(!rec.has_user_labels());
    }

    #[test]
    fn user_correction_shadows_prediction() {
        let mut rec = record(600);
        assert_eq!(rec.main_label(), None);

        rec.server_main = Some("walking".to_string());
        assert_eq!(rec.main_label(), Some("walking"));

        rec.user_main = Some("running".to_string());
        assert_eq!(rec.main_label(), Some("running"));
    }

    #[test]
    fn has_user_labels_checks_every_set() {
        let mut rec = record(600);
        rec.server_main = Some("walking".to_string());
        assert!(!rec.has_user_labels());

        rec.moods = vec!["calm".to_string()];
        assert!(rec.has_user_labels());

        let mut rec = record(660);
        rec.secondary = vec!["at_home".to_string()];
        assert!(rec.has_user_labels());

        let mut rec = record(720);
        rec.user_main = Some("sitting".to_string());
        assert!(rec.has_user_labels());
    }

    #[test]
    fn equivalence_ignores_label_order() {
        let mut a = record(600);
        a.user_main = Some("walking".to_string());
        a.secondary = vec!["outside".to_string(), "with_friends".to_string()];

        let mut b = record(660);
        b.user_main = Some("walking".to_string());
        b.secondary = vec!["with_friends".to_string(), "outside".to_string()];

        assert!(a.labels_equivalent(&b));

        b.secondary.push("exercising".to_string());
        assert!(!a.labels_equivalent(&b));
    }

    #[test]
    fn equivalence_compares_effective_main() {
        let mut predicted = record(600);
        predicted.server_main = Some("walking".to_string());

        let mut corrected = record(660);
        corrected.user_main = Some("walking".to_string());
        corrected.label_source = LabelSource::UserCorrected;

        assert!(predicted.labels_equivalent(&corrected));

        corrected.user_main = Some("sitting".to_string());
        assert!(!predicted.labels_equivalent(&corrected));
    }

    #[test]
    fn equivalence_compares_moods() {
        let mut a = record(600);
        a.moods = vec!["happy".to_string()];
        let b = record(660);
        assert!(!a.labels_equivalent(&b));

        a.moods.clear();
        assert!(a.labels_equivalent(&b));
    }

    #[test]
    fn serde_roundtrip_keeps_labels() {
        let mut rec = record(600);
        rec.label_source = LabelSource::UserCorrected;
        rec.user_main = Some("walking".to_string());
        rec.secondary = vec!["outside".to_string()];

        let json = serde_json::to_string(&rec).unwrap();
        let parsed: ActivityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rec);
    }
}
