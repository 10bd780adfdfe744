//! Reclaim command: delete abandoned recordings.

use std::io::Write;

use anyhow::Result;

use minlog_core::TimeGranule;
use minlog_db::{ArtifactProbe, Database};

use super::util::parse_granule;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    artifacts: &dyn ArtifactProbe,
    from: Option<&str>,
) -> Result<()> {
    let from = match from {
        Some(s) => parse_granule(s)?,
        None => TimeGranule::MIN,
    };

    let stats = db.reclaim_orphans(from, artifacts)?;
    writeln!(
        writer,
        "Examined {} prediction-less records: deleted {}, kept {}.",
        stats.examined,
        stats.deleted,
        stats.retained()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::DirArtifacts;

    const BASE: i64 = 1_735_689_600;

    #[test]
    fn reports_examined_and_deleted_counts() {
        let dir = tempfile::tempdir().unwrap();
        // The second orphan still has its artifact and must survive.
        std::fs::write(dir.path().join(format!("{}.zip", BASE + 60)), b"").unwrap();

        let db = Database::open_in_memory().unwrap();
        db.create_record(TimeGranule::from_secs(BASE)).unwrap();
        db.create_record(TimeGranule::from_secs(BASE + 60)).unwrap();

        let artifacts = DirArtifacts::new(dir.path().to_path_buf());
        let mut output = Vec::new();
        run(&mut output, &db, &artifacts, None).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "Examined 2 prediction-less records: deleted 1, kept 1.\n"
        );
        assert!(
            db.fetch_record(TimeGranule::from_secs(BASE))
                .unwrap()
                .is_none()
        );
        assert!(
            db.fetch_record(TimeGranule::from_secs(BASE + 60))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn from_bound_limits_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.create_record(TimeGranule::from_secs(BASE)).unwrap();
        db.create_record(TimeGranule::from_secs(BASE + 60)).unwrap();

        let artifacts = DirArtifacts::new(dir.path().to_path_buf());
        let mut output = Vec::new();
        let from = (BASE + 60).to_string();
        run(&mut output, &db, &artifacts, Some(&from)).unwrap();

        assert!(
            db.fetch_record(TimeGranule::from_secs(BASE))
                .unwrap()
                .is_some()
        );
        assert!(
            db.fetch_record(TimeGranule::from_secs(BASE + 60))
                .unwrap()
                .is_none()
        );
    }
}
