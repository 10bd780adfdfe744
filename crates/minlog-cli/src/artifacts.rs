//! Directory-backed artifact probe.

use std::path::PathBuf;

use minlog_db::ArtifactProbe;
use minlog_core::TimeGranule;

/// Checks for sensor artifacts stored as `<secs>.zip` files in one
/// directory, the layout the recorder writes.
#[derive(Debug, Clone)]
pub struct DirArtifacts {
    dir: PathBuf,
}

impl DirArtifacts {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ArtifactProbe for DirArtifacts {
    fn has_artifact(&self, timestamp: TimeGranule) -> bool {
        self.dir
            .join(format!("{}.zip", timestamp.as_secs()))
            .is_file()
    }
}
