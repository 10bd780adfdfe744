//! Seams to the store's two external collaborators.

use minlog_core::{ActivityRecord, TimeGranule};

/// Answers whether a raw sensor artifact is still waiting for a minute.
///
/// Reclamation keeps prediction-less records alive while their artifact
/// exists, since a prediction may yet arrive for them.
pub trait ArtifactProbe: Send + Sync {
    /// Whether an artifact exists for the given minute.
    fn has_artifact(&self, timestamp: TimeGranule) -> bool;
}

/// Receives records whose labels changed and should reach the feedback
/// pipeline.
///
/// Submission is fire-and-forget from the store's point of view;
/// implementations handle and log their own failures instead of
/// surfacing them.
pub trait FeedbackSink: Send + Sync {
    /// Hands over the post-update state of a record.
    fn submit(&self, record: &ActivityRecord);
}
