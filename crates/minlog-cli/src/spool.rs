//! Filesystem feedback spool.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use minlog_core::ActivityRecord;
use minlog_db::FeedbackSink;

/// Queues label feedback by appending one JSON line per submission.
///
/// The spool stands in for the remote feedback pipeline: something else
/// drains the file and talks to the network. Failures are logged and
/// swallowed, matching the sink contract; a labeling must never fail
/// because the spool is unwritable.
#[derive(Debug, Clone)]
pub struct JsonlSpool {
    path: PathBuf,
}

impl JsonlSpool {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, record: &ActivityRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl FeedbackSink for JsonlSpool {
    fn submit(&self, record: &ActivityRecord) {
        if let Err(err) = self.append(record) {
            tracing::warn!(
                path = %self.path.display(),
                timestamp = %record.timestamp,
                %err,
                "failed to spool feedback"
            );
        }
    }
}
