//! Storage layer for the minute activity log.
//!
//! Provides persistence for per-minute activity records and the singleton
//! settings row using `rusqlite`.
//!
//! # Thread Safety
//!
//! [`Database`] wraps its `rusqlite::Connection` in a single coarse
//! `std::sync::Mutex`, so one handle can be shared across threads (for
//! example behind an `Arc`) and every operation, including
//! read-modify-write sequences such as the settings update, runs under
//! the lock as one unit. A single process is assumed to own the database
//! file, matching how the recorder runs; there is no cross-process busy
//! handling beyond rusqlite defaults.
//!
//! # Schema
//!
//! Timestamps are INTEGER seconds since the Unix epoch, one row per
//! recorded minute keyed by that timestamp. Label sets are stored as
//! comma-separated TEXT with the empty set as the empty string, so the
//! stored form round-trips exactly. The settings table holds one row,
//! created lazily with defaults on first read.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use minlog_core::{
    ActivityRecord, ContinuousSegment, GRANULE_SECS, LabelKind, LabelSource, TimeGranule,
    join_labels, merge_continuous, split_labels,
};

mod hooks;
mod notify;

pub use hooks::{ArtifactProbe, FeedbackSink};
pub use notify::{ChangeNotifier, RecordsUpdated};

/// Default cap on stored sensor examples.
pub const DEFAULT_MAX_STORED_EXAMPLES: i64 = 600;

/// Default seconds between activity notifications.
pub const DEFAULT_NOTIFICATION_INTERVAL_SECS: i64 = 600;

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A record already exists for the requested minute.
    #[error("a record already exists for minute {0}")]
    RecordExists(TimeGranule),
    /// Another caller panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
    notifier: ChangeNotifier,
    feedback: Option<Box<dyn FeedbackSink>>,
}

/// Full replacement label state applied by [`Database::set_values`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUpdate {
    /// Provenance to record for the main label.
    pub source: LabelSource,
    /// Server-predicted main activity, or `None` to clear it.
    pub server_main: Option<String>,
    /// User-supplied main activity, or `None` to clear it.
    pub user_main: Option<String>,
    /// Replacement secondary label set.
    pub secondary: Vec<String>,
    /// Replacement mood label set.
    pub moods: Vec<String>,
}

/// A geographic point, used for the home-bubble center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The singleton settings row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Stable installation identifier, an uppercase UUID. Never changes
    /// after the row is first created.
    pub uuid: String,
    /// Cap on locally stored sensor examples.
    pub max_stored_examples: i64,
    /// Seconds between activity notifications.
    pub notification_interval_secs: i64,
    /// Whether location-based home sensing is enabled.
    pub home_sensing: bool,
    /// Whether the location bubble is in use.
    pub bubble_used: bool,
    /// Center of the location bubble.
    pub bubble_center: GeoPoint,
}

/// A partial settings change; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub max_stored_examples: Option<i64>,
    pub notification_interval_secs: Option<i64>,
    pub home_sensing: Option<bool>,
    pub bubble_used: Option<bool>,
    pub bubble_center: Option<GeoPoint>,
}

impl SettingsUpdate {
    /// Whether no field is set, making the update a plain re-read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.max_stored_examples.is_none()
            && self.notification_interval_secs.is_none()
            && self.home_sensing.is_none()
            && self.bubble_used.is_none()
            && self.bubble_center.is_none()
    }
}

/// Summary of an orphan reclamation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimStats {
    /// Prediction-less records found inside the eligible window.
    pub examined: usize,
    /// Records deleted because no artifact was waiting for them.
    pub deleted: usize,
}

impl ReclaimStats {
    /// Records left in place because their artifact still exists.
    #[must_use]
    pub const fn retained(&self) -> usize {
        self.examined - self.deleted
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized automatically on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Attaches the feedback sink that receives user label changes.
    ///
    /// Without a sink, label updates still persist and notify; they just
    /// never reach the feedback pipeline.
    #[must_use]
    pub fn with_feedback_sink(mut self, sink: Box<dyn FeedbackSink>) -> Self {
        self.feedback = Some(sink);
        self
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            notifier: ChangeNotifier::new(),
            feedback: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Subscribes to change events.
    ///
    /// One event is broadcast after every successful mutation; see
    /// [`ChangeNotifier`] for delivery semantics.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecordsUpdated> {
        self.notifier.subscribe()
    }

    /// Creates the blank record for a minute.
    ///
    /// Refuses to touch an existing record: starting a second recording
    /// for the same minute is a caller bug, and the stored labels must
    /// survive it.
    pub fn create_record(&self, timestamp: TimeGranule) -> Result<ActivityRecord, DbError> {
        let record = ActivityRecord::new(timestamp);
        {
            let conn = self.lock()?;
            if record_row(&conn, timestamp)?.is_some() {
                tracing::error!(%timestamp, "refusing to create a second record for the same minute");
                return Err(DbError::RecordExists(timestamp));
            }
            conn.execute(
                "
                INSERT INTO activity_records
                (timestamp, label_source, server_main, user_main, secondary_csv, mood_csv)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    record.timestamp.as_secs(),
                    record.label_source.code(),
                    record.server_main,
                    record.user_main,
                    join_labels(&record.secondary),
                    join_labels(&record.moods),
                ],
            )?;
        }
        self.notifier.notify();
        Ok(record)
    }

    /// Fetches the record for a minute, if one exists.
    pub fn fetch_record(&self, timestamp: TimeGranule) -> Result<Option<ActivityRecord>, DbError> {
        let conn = self.lock()?;
        record_row(&conn, timestamp)
    }

    /// Lists records with `from <= timestamp <= to`, oldest first.
    ///
    /// An inverted range is an empty list, not an error.
    pub fn records_in_range(
        &self,
        from: TimeGranule,
        to: TimeGranule,
    ) -> Result<Vec<ActivityRecord>, DbError> {
        if from > to {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        records_between(&conn, from, to)
    }

    /// Rewrites every label field of a record, in the store and in the
    /// caller's object.
    ///
    /// The two views never diverge: `record` is only mutated after the
    /// row update succeeds, and callers should treat the passed-in
    /// mutation as part of the contract rather than a surprise. Always
    /// broadcasts a change event; hands the updated record to the
    /// feedback sink only when `notify_downstream` is set.
    pub fn set_values(
        &self,
        record: &mut ActivityRecord,
        update: LabelUpdate,
        notify_downstream: bool,
    ) -> Result<(), DbError> {
        {
            let conn = self.lock()?;
            persist_labels(&conn, record.timestamp, &update)?;
        }
        record.label_source = update.source;
        record.server_main = update.server_main;
        record.user_main = update.user_main;
        record.secondary = update.secondary;
        record.moods = update.moods;

        self.notifier.notify();
        if notify_downstream {
            if let Some(sink) = &self.feedback {
                sink.submit(record);
            }
        }
        Ok(())
    }

    /// Applies a user labeling: keeps the stored server prediction and
    /// always submits feedback.
    pub fn set_user_labels(
        &self,
        record: &mut ActivityRecord,
        source: LabelSource,
        user_main: Option<String>,
        secondary: Vec<String>,
        moods: Vec<String>,
    ) -> Result<(), DbError> {
        let update = LabelUpdate {
            source,
            server_main: record.server_main.clone(),
            user_main,
            secondary,
            moods,
        };
        self.set_values(record, update, true)
    }

    /// Applies a server prediction: updates only the prediction field,
    /// preserving provenance and user labels, and never submits
    /// feedback. A prediction is not user feedback.
    pub fn set_server_prediction(
        &self,
        record: &mut ActivityRecord,
        prediction: Option<String>,
    ) -> Result<(), DbError> {
        let update = LabelUpdate {
            source: record.label_source,
            server_main: prediction,
            user_main: record.user_main.clone(),
            secondary: record.secondary.clone(),
            moods: record.moods.clone(),
        };
        self.set_values(record, update, false)
    }

    /// Hard-deletes the record for a minute.
    ///
    /// Returns whether a row was actually removed; deleting an absent
    /// minute is a quiet no-op.
    pub fn delete_record(&self, timestamp: TimeGranule) -> Result<bool, DbError> {
        let affected = {
            let conn = self.lock()?;
            conn.execute(
                "DELETE FROM activity_records WHERE timestamp = ?",
                params![timestamp.as_secs()],
            )?
        };
        if affected > 0 {
            self.notifier.notify();
        }
        Ok(affected > 0)
    }

    /// Label-aware merge of the records in a range; see
    /// [`merge_continuous`].
    pub fn continuous_segments_in_range(
        &self,
        from: TimeGranule,
        to: TimeGranule,
    ) -> Result<Vec<ContinuousSegment>, DbError> {
        Ok(merge_continuous(self.records_in_range(from, to)?))
    }

    /// Wraps every record in a range into one segment regardless of
    /// label changes or gaps. `None` when the range holds no records.
    pub fn single_segment_in_range(
        &self,
        from: TimeGranule,
        to: TimeGranule,
    ) -> Result<Option<ContinuousSegment>, DbError> {
        Ok(ContinuousSegment::new(self.records_in_range(from, to)?))
    }

    /// Counts labels of one kind over `[since, now]`.
    ///
    /// An absent `since` means all of history. Main labels count user
    /// corrections only; see [`minlog_core::label_counts`].
    pub fn label_counts(
        &self,
        since: Option<TimeGranule>,
        kind: LabelKind,
    ) -> Result<HashMap<String, usize>, DbError> {
        let records = self.records_since(since)?;
        Ok(minlog_core::label_counts(&records, kind))
    }

    /// Labels of one kind over `[since, now]` with counts, most frequent
    /// first; ties rank alphabetically.
    pub fn ranked_label_counts(
        &self,
        since: Option<TimeGranule>,
        kind: LabelKind,
    ) -> Result<Vec<(String, usize)>, DbError> {
        let records = self.records_since(since)?;
        Ok(minlog_core::ranked_label_counts(&records, kind))
    }

    /// Just the ranked labels of [`Database::ranked_label_counts`].
    pub fn ranked_labels(
        &self,
        since: Option<TimeGranule>,
        kind: LabelKind,
    ) -> Result<Vec<String>, DbError> {
        let records = self.records_since(since)?;
        Ok(minlog_core::ranked_labels(&records, kind))
    }

    fn records_since(&self, since: Option<TimeGranule>) -> Result<Vec<ActivityRecord>, DbError> {
        self.records_in_range(since.unwrap_or(TimeGranule::MIN), TimeGranule::now())
    }

    /// The newest record in `[since, now]` carrying any user label, or
    /// `None` when the user has labeled nothing in that window.
    pub fn latest_user_labeled(
        &self,
        since: Option<TimeGranule>,
    ) -> Result<Option<ActivityRecord>, DbError> {
        let from = since.unwrap_or(TimeGranule::MIN);
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "
                SELECT timestamp, label_source, server_main, user_main, secondary_csv, mood_csv
                FROM activity_records
                WHERE timestamp >= ? AND timestamp <= ?
                  AND (user_main IS NOT NULL OR secondary_csv <> '' OR mood_csv <> '')
                ORDER BY timestamp DESC
                LIMIT 1
                ",
                params![from.as_secs(), TimeGranule::now().as_secs()],
                map_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Deletes abandoned records: prediction-less rows old enough to be
    /// outside the recording guard band and without a pending artifact.
    ///
    /// Rows whose artifact still exists are awaiting a prediction and
    /// are kept. The trailing 60 seconds are never touched so an
    /// in-progress recording cannot be reclaimed out from under the
    /// recorder. Destructive and non-reversible.
    pub fn reclaim_orphans(
        &self,
        from: TimeGranule,
        artifacts: &dyn ArtifactProbe,
    ) -> Result<ReclaimStats, DbError> {
        self.reclaim_orphans_at(from, artifacts, TimeGranule::now())
    }

    fn reclaim_orphans_at(
        &self,
        from: TimeGranule,
        artifacts: &dyn ArtifactProbe,
        now: TimeGranule,
    ) -> Result<ReclaimStats, DbError> {
        let cutoff = now.offset_secs(-GRANULE_SECS);
        let mut stats = ReclaimStats::default();
        if from > cutoff {
            return Ok(stats);
        }
        {
            let mut conn = self.lock()?;
            let candidates: Vec<i64> = {
                let mut stmt = conn.prepare(
                    "
                    SELECT timestamp
                    FROM activity_records
                    WHERE timestamp >= ? AND timestamp <= ? AND server_main IS NULL
                    ORDER BY timestamp ASC
                    ",
                )?;
                let rows =
                    stmt.query_map(params![from.as_secs(), cutoff.as_secs()], |row| row.get(0))?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                out
            };
            stats.examined = candidates.len();

            let tx = conn.transaction()?;
            {
                let mut delete =
                    tx.prepare("DELETE FROM activity_records WHERE timestamp = ?")?;
                for secs in candidates {
                    let timestamp = TimeGranule::from_secs(secs);
                    if artifacts.has_artifact(timestamp) {
                        tracing::debug!(%timestamp, "keeping record that is still awaiting a prediction");
                        continue;
                    }
                    let affected = delete.execute(params![secs])?;
                    if affected != 1 {
                        tracing::error!(
                            %timestamp,
                            affected,
                            "orphan delete touched an unexpected number of rows"
                        );
                    }
                    stats.deleted += affected;
                }
            }
            tx.commit()?;
        }
        if stats.deleted > 0 {
            self.notifier.notify();
        }
        tracing::debug!(
            examined = stats.examined,
            deleted = stats.deleted,
            "reclaimed orphan records"
        );
        Ok(stats)
    }

    /// Returns the settings row, creating it with defaults on first use.
    pub fn get_or_create_settings(&self) -> Result<Settings, DbError> {
        let conn = self.lock()?;
        settings_row_or_insert(&conn)
    }

    /// Applies a partial settings change and returns the row as the
    /// store now holds it.
    ///
    /// Unset fields keep their stored value; the UUID can never change.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings, DbError> {
        let conn = self.lock()?;
        let current = settings_row_or_insert(&conn)?;
        if update.is_empty() {
            return Ok(current);
        }

        let (assignments, values) = update_assignments(update);
        let sql = format!("UPDATE settings SET {}", assignments.join(", "));
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected != 1 {
            tracing::error!(affected, "settings update touched an unexpected number of rows");
        }
        // Re-read so the caller sees exactly what the store now holds.
        settings_row_or_insert(&conn)
    }
}

/// Initializes the schema. Idempotent, safe on an already-initialized
/// database.
fn init(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "
        -- One row per recorded minute, keyed by its timestamp.
        -- secondary_csv / mood_csv: comma-separated labels, '' for none.
        CREATE TABLE IF NOT EXISTS activity_records (
            timestamp INTEGER PRIMARY KEY,
            label_source INTEGER NOT NULL,
            server_main TEXT,
            user_main TEXT,
            secondary_csv TEXT NOT NULL DEFAULT '',
            mood_csv TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_activity_server_main
            ON activity_records(server_main);

        CREATE TABLE IF NOT EXISTS settings (
            uuid TEXT PRIMARY KEY,
            max_stored_examples INTEGER NOT NULL,
            notification_interval_secs INTEGER NOT NULL,
            home_sensing INTEGER NOT NULL,
            bubble_used INTEGER NOT NULL,
            bubble_center_lat DOUBLE PRECISION NOT NULL,
            bubble_center_lon DOUBLE PRECISION NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityRecord> {
    let code: i64 = row.get(1)?;
    let label_source = LabelSource::from_code(code).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Integer, Box::new(err))
    })?;
    let secondary_csv: String = row.get(4)?;
    let mood_csv: String = row.get(5)?;
    Ok(ActivityRecord {
        timestamp: TimeGranule::from_secs(row.get(0)?),
        label_source,
        server_main: row.get(2)?,
        user_main: row.get(3)?,
        secondary: split_labels(&secondary_csv),
        moods: split_labels(&mood_csv),
    })
}

fn record_row(
    conn: &Connection,
    timestamp: TimeGranule,
) -> Result<Option<ActivityRecord>, DbError> {
    let record = conn
        .query_row(
            "
            SELECT timestamp, label_source, server_main, user_main, secondary_csv, mood_csv
            FROM activity_records
            WHERE timestamp = ?
            ",
            params![timestamp.as_secs()],
            map_record,
        )
        .optional()?;
    Ok(record)
}

fn records_between(
    conn: &Connection,
    from: TimeGranule,
    to: TimeGranule,
) -> Result<Vec<ActivityRecord>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT timestamp, label_source, server_main, user_main, secondary_csv, mood_csv
        FROM activity_records
        WHERE timestamp >= ? AND timestamp <= ?
        ORDER BY timestamp ASC
        ",
    )?;
    let rows = stmt.query_map(params![from.as_secs(), to.as_secs()], map_record)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

fn persist_labels(
    conn: &Connection,
    timestamp: TimeGranule,
    update: &LabelUpdate,
) -> Result<(), DbError> {
    let affected = conn.execute(
        "
        UPDATE activity_records
        SET label_source = ?, server_main = ?, user_main = ?, secondary_csv = ?, mood_csv = ?
        WHERE timestamp = ?
        ",
        params![
            update.source.code(),
            update.server_main,
            update.user_main,
            join_labels(&update.secondary),
            join_labels(&update.moods),
            timestamp.as_secs(),
        ],
    )?;
    if affected != 1 {
        tracing::error!(
            %timestamp,
            affected,
            "label update touched an unexpected number of rows"
        );
    }
    Ok(())
}

fn settings_row(conn: &Connection) -> Result<Option<Settings>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT uuid, max_stored_examples, notification_interval_secs,
               home_sensing, bubble_used, bubble_center_lat, bubble_center_lon
        FROM settings
        ",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Settings {
            uuid: row.get(0)?,
            max_stored_examples: row.get(1)?,
            notification_interval_secs: row.get(2)?,
            home_sensing: row.get(3)?,
            bubble_used: row.get(4)?,
            bubble_center: GeoPoint {
                latitude: row.get(5)?,
                longitude: row.get(6)?,
            },
        })
    })?;
    let mut all = Vec::new();
    for row in rows {
        all.push(row?);
    }
    if all.len() > 1 {
        tracing::warn!(rows = all.len(), "settings table should hold exactly one row");
    }
    Ok(all.into_iter().next())
}

fn settings_row_or_insert(conn: &Connection) -> Result<Settings, DbError> {
    if let Some(settings) = settings_row(conn)? {
        return Ok(settings);
    }
    let settings = Settings {
        uuid: Uuid::new_v4().to_string().to_uppercase(),
        max_stored_examples: DEFAULT_MAX_STORED_EXAMPLES,
        notification_interval_secs: DEFAULT_NOTIFICATION_INTERVAL_SECS,
        home_sensing: false,
        bubble_used: false,
        bubble_center: GeoPoint {
            latitude: 0.0,
            longitude: 0.0,
        },
    };
    conn.execute(
        "
        INSERT INTO settings
        (uuid, max_stored_examples, notification_interval_secs,
         home_sensing, bubble_used, bubble_center_lat, bubble_center_lon)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            settings.uuid,
            settings.max_stored_examples,
            settings.notification_interval_secs,
            settings.home_sensing,
            settings.bubble_used,
            settings.bubble_center.latitude,
            settings.bubble_center.longitude,
        ],
    )?;
    tracing::debug!(uuid = %settings.uuid, "created settings row with defaults");
    Ok(settings)
}

fn update_assignments(update: &SettingsUpdate) -> (Vec<&'static str>, Vec<Value>) {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    if let Some(max) = update.max_stored_examples {
        assignments.push("max_stored_examples = ?");
        values.push(Value::Integer(max));
    }
    if let Some(interval) = update.notification_interval_secs {
        assignments.push("notification_interval_secs = ?");
        values.push(Value::Integer(interval));
    }
    if let Some(enabled) = update.home_sensing {
        assignments.push("home_sensing = ?");
        values.push(Value::Integer(i64::from(enabled)));
    }
    if let Some(used) = update.bubble_used {
        assignments.push("bubble_used = ?");
        values.push(Value::Integer(i64::from(used)));
    }
    if let Some(center) = update.bubble_center {
        assignments.push("bubble_center_lat = ?");
        values.push(Value::Real(center.latitude));
        assignments.push("bubble_center_lon = ?");
        values.push(Value::Real(center.longitude));
    }
    (assignments, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn minute(n: i64) -> TimeGranule {
        TimeGranule::from_secs(n * 60)
    }

    fn user_update(main: &str) -> LabelUpdate {
        LabelUpdate {
            source: LabelSource::UserCorrected,
            server_main: None,
            user_main: Some(main.to_string()),
            secondary: Vec::new(),
            moods: Vec::new(),
        }
    }

    struct RecordingSink {
        submitted: Arc<Mutex<Vec<ActivityRecord>>>,
    }

    impl FeedbackSink for RecordingSink {
        fn submit(&self, record: &ActivityRecord) {
            self.submitted.lock().unwrap().push(record.clone());
        }
    }

    struct FixedArtifacts(HashSet<i64>);

    impl FixedArtifacts {
        fn for_minutes(minutes: &[i64]) -> Self {
            Self(minutes.iter().map(|n| n * 60).collect())
        }
    }

    impl ArtifactProbe for FixedArtifacts {
        fn has_artifact(&self, timestamp: TimeGranule) -> bool {
            self.0.contains(&timestamp.as_secs())
        }
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let conn = db.conn.lock().unwrap();

        let record_columns = table_columns(&conn, "activity_records");
        assert_eq!(
            record_columns,
            vec![
                "timestamp",
                "label_source",
                "server_main",
                "user_main",
                "secondary_csv",
                "mood_csv",
            ]
        );

        let settings_columns = table_columns(&conn, "settings");
        assert_eq!(
            settings_columns,
            vec![
                "uuid",
                "max_stored_examples",
                "notification_interval_secs",
                "home_sensing",
                "bubble_used",
                "bubble_center_lat",
                "bubble_center_lon",
            ]
        );
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    #[test]
    fn create_then_fetch_returns_blank_record() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_record(minute(10)).unwrap();
        assert_eq!(created, ActivityRecord::new(minute(10)));

        let fetched = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.label_source, LabelSource::Default);
        assert_eq!(fetched.main_label(), None);
        assert!(fetched.secondary.is_empty());
        assert!(fetched.moods.is_empty());
    }

    #[test]
    fn fetch_missing_record_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.fetch_record(minute(10)).unwrap().is_none());
    }

    #[test]
    fn duplicate_create_fails_and_keeps_first_record() {
        let db = Database::open_in_memory().unwrap();
        let mut first = db.create_record(minute(10)).unwrap();
        db.set_values(&mut first, user_update("walking"), false)
            .unwrap();

        let err = db.create_record(minute(10)).unwrap_err();
        assert!(matches!(err, DbError::RecordExists(t) if t == minute(10)));

        let stored = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(stored.user_main.as_deref(), Some("walking"));
    }

    #[test]
    fn set_values_updates_store_and_caller_object() {
        let db = Database::open_in_memory().unwrap();
        let mut record = db.create_record(minute(10)).unwrap();

        let update = LabelUpdate {
            source: LabelSource::UserCorrected,
            server_main: Some("walking".to_string()),
            user_main: Some("running".to_string()),
            secondary: vec!["outside".to_string()],
            moods: vec!["happy".to_string()],
        };
        db.set_values(&mut record, update, false).unwrap();

        assert_eq!(record.label_source, LabelSource::UserCorrected);
        assert_eq!(record.main_label(), Some("running"));

        let stored = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn set_values_submits_feedback_only_when_asked() {
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let db = Database::open_in_memory()
            .unwrap()
            .with_feedback_sink(Box::new(RecordingSink {
                submitted: Arc::clone(&submitted),
            }));

        let mut record = db.create_record(minute(10)).unwrap();
        db.set_values(&mut record, user_update("walking"), false)
            .unwrap();
        assert!(submitted.lock().unwrap().is_empty());

        db.set_values(&mut record, user_update("sitting"), true)
            .unwrap();
        let seen = submitted.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_main.as_deref(), Some("sitting"));
    }

    #[test]
    fn set_user_labels_preserves_server_prediction() {
        let db = Database::open_in_memory().unwrap();
        let mut record = db.create_record(minute(10)).unwrap();
        db.set_server_prediction(&mut record, Some("walking".to_string()))
            .unwrap();

        db.set_user_labels(
            &mut record,
            LabelSource::UserCorrected,
            Some("running".to_string()),
            vec!["outside".to_string()],
            Vec::new(),
        )
        .unwrap();

        let stored = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(stored.server_main.as_deref(), Some("walking"));
        assert_eq!(stored.user_main.as_deref(), Some("running"));
        assert_eq!(stored.label_source, LabelSource::UserCorrected);
    }

    #[test]
    fn set_server_prediction_preserves_user_labels_and_skips_feedback() {
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let db = Database::open_in_memory()
            .unwrap()
            .with_feedback_sink(Box::new(RecordingSink {
                submitted: Arc::clone(&submitted),
            }));

        let mut record = db.create_record(minute(10)).unwrap();
        db.set_user_labels(
            &mut record,
            LabelSource::UserCorrected,
            Some("running".to_string()),
            Vec::new(),
            vec!["tired".to_string()],
        )
        .unwrap();
        assert_eq!(submitted.lock().unwrap().len(), 1);

        db.set_server_prediction(&mut record, Some("walking".to_string()))
            .unwrap();

        let stored = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(stored.server_main.as_deref(), Some("walking"));
        assert_eq!(stored.user_main.as_deref(), Some("running"));
        assert_eq!(stored.moods, vec!["tired".to_string()]);
        assert_eq!(stored.label_source, LabelSource::UserCorrected);
        // No extra feedback for the prediction.
        assert_eq!(submitted.lock().unwrap().len(), 1);
    }

    #[test]
    fn label_sets_roundtrip_through_storage() {
        let db = Database::open_in_memory().unwrap();
        let mut record = db.create_record(minute(10)).unwrap();

        let update = LabelUpdate {
            source: LabelSource::UserCorrected,
            server_main: None,
            user_main: Some("walking".to_string()),
            secondary: vec!["outside".to_string(), "with_friends".to_string()],
            moods: Vec::new(),
        };
        db.set_values(&mut record, update, false).unwrap();

        let stored = db.fetch_record(minute(10)).unwrap().unwrap();
        assert_eq!(
            stored.secondary,
            vec!["outside".to_string(), "with_friends".to_string()]
        );
        assert!(stored.moods.is_empty());
    }

    #[test]
    fn inverted_range_is_empty_not_error() {
        let db = Database::open_in_memory().unwrap();
        db.create_record(minute(10)).unwrap();
        let records = db.records_in_range(minute(20), minute(10)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn range_scan_is_inclusive_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        for n in [12, 10, 11, 14] {
            db.create_record(minute(n)).unwrap();
        }

        let records = db.records_in_range(minute(10), minute(12)).unwrap();
        let minutes: Vec<i64> = records
            .iter()
            .map(|r| r.timestamp.as_secs() / 60)
            .collect();
        assert_eq!(minutes, vec![10, 11, 12]);
    }

    #[test]
    fn segments_split_on_label_change_and_gap() {
        let db = Database::open_in_memory().unwrap();
        for (n, label) in [(10, "walking"), (11, "walking"), (13, "walking"), (14, "sitting")] {
            let mut record = db.create_record(minute(n)).unwrap();
            db.set_values(&mut record, user_update(label), false)
                .unwrap();
        }

        let segments = db
            .continuous_segments_in_range(minute(10), minute(14))
            .unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].minutes(), 2);
        assert_eq!(segments[1].minutes(), 1);
        assert_eq!(segments[2].main_label(), Some("sitting"));
    }

    #[test]
    fn single_segment_ignores_label_changes() {
        let db = Database::open_in_memory().unwrap();
        for (n, label) in [(10, "walking"), (11, "sitting")] {
            let mut record = db.create_record(minute(n)).unwrap();
            db.set_values(&mut record, user_update(label), false)
                .unwrap();
        }

        let segment = db
            .single_segment_in_range(minute(10), minute(11))
            .unwrap()
            .unwrap();
        assert_eq!(segment.minutes(), 2);
        assert_eq!(segment.start_time(), minute(10));
        assert_eq!(segment.end_time(), minute(11));

        assert!(db.single_segment_in_range(minute(20), minute(30)).unwrap().is_none());
    }

    #[test]
    fn ranked_labels_respect_counts_and_window() {
        let db = Database::open_in_memory().unwrap();
        for (n, label) in [(10, "walking"), (11, "walking"), (12, "sitting")] {
            let mut record = db.create_record(minute(n)).unwrap();
            db.set_values(&mut record, user_update(label), false)
                .unwrap();
        }

        let counts = db.label_counts(None, LabelKind::Main).unwrap();
        assert_eq!(counts["walking"], 2);
        assert_eq!(counts["sitting"], 1);

        let ranked = db.ranked_labels(None, LabelKind::Main).unwrap();
        assert_eq!(ranked[0], "walking");

        // A later window sees only the sitting minute.
        let ranked = db.ranked_labels(Some(minute(12)), LabelKind::Main).unwrap();
        assert_eq!(ranked, vec!["sitting".to_string()]);
    }

    #[test]
    fn latest_user_labeled_returns_newest_match() {
        let db = Database::open_in_memory().unwrap();
        let mut early = db.create_record(minute(10)).unwrap();
        db.set_values(&mut early, user_update("walking"), false)
            .unwrap();
        let mut late = db.create_record(minute(12)).unwrap();
        db.set_values(&mut late, user_update("sitting"), false)
            .unwrap();
        // A newer record without user labels must not win.
        let mut predicted = db.create_record(minute(13)).unwrap();
        db.set_server_prediction(&mut predicted, Some("biking".to_string()))
            .unwrap();

        let latest = db.latest_user_labeled(None).unwrap().unwrap();
        assert_eq!(latest.timestamp, minute(12));
        assert_eq!(latest.user_main.as_deref(), Some("sitting"));

        assert!(db.latest_user_labeled(Some(minute(13))).unwrap().is_none());
    }

    #[test]
    fn delete_record_reports_whether_it_removed_anything() {
        let db = Database::open_in_memory().unwrap();
        db.create_record(minute(10)).unwrap();

        assert!(db.delete_record(minute(10)).unwrap());
        assert!(!db.delete_record(minute(10)).unwrap());
        assert!(db.fetch_record(minute(10)).unwrap().is_none());
    }

    #[test]
    fn reclaim_deletes_only_artifactless_orphans() {
        let db = Database::open_in_memory().unwrap();
        // Orphan with no artifact: goes away.
        db.create_record(minute(10)).unwrap();
        // Orphan whose artifact still exists: stays.
        db.create_record(minute(11)).unwrap();
        // Predicted record: not a candidate at all.
        let mut predicted = db.create_record(minute(12)).unwrap();
        db.set_server_prediction(&mut predicted, Some("walking".to_string()))
            .unwrap();

        let artifacts = FixedArtifacts::for_minutes(&[11]);
        let now = minute(100);
        let stats = db.reclaim_orphans_at(minute(0), &artifacts, now).unwrap();

        assert_eq!(stats.examined, 2);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.retained(), 1);
        assert!(db.fetch_record(minute(10)).unwrap().is_none());
        assert!(db.fetch_record(minute(11)).unwrap().is_some());
        assert!(db.fetch_record(minute(12)).unwrap().is_some());
    }

    #[test]
    fn reclaim_never_touches_the_guard_band() {
        let db = Database::open_in_memory().unwrap();
        db.create_record(minute(10)).unwrap();

        // "Now" is 59 seconds past the record, inside the guard band.
        let artifacts = FixedArtifacts::for_minutes(&[]);
        let now = minute(10).offset_secs(59);
        let stats = db.reclaim_orphans_at(minute(0), &artifacts, now).unwrap();

        assert_eq!(stats.examined, 0);
        assert_eq!(stats.deleted, 0);
        assert!(db.fetch_record(minute(10)).unwrap().is_some());

        // One second later the record leaves the guard band.
        let now = minute(10).offset_secs(60);
        let stats = db.reclaim_orphans_at(minute(0), &artifacts, now).unwrap();
        assert_eq!(stats.deleted, 1);
    }

    #[test]
    fn reclaim_with_inverted_window_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        db.create_record(minute(10)).unwrap();

        let artifacts = FixedArtifacts::for_minutes(&[]);
        let stats = db
            .reclaim_orphans_at(minute(50), &artifacts, minute(20))
            .unwrap();
        assert_eq!(stats, ReclaimStats::default());
    }

    #[test]
    fn settings_are_created_once_with_defaults() {
        let db = Database::open_in_memory().unwrap();
        let first = db.get_or_create_settings().unwrap();
        let second = db.get_or_create_settings().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.max_stored_examples, DEFAULT_MAX_STORED_EXAMPLES);
        assert_eq!(
            first.notification_interval_secs,
            DEFAULT_NOTIFICATION_INTERVAL_SECS
        );
        assert!(!first.home_sensing);
        assert!(!first.bubble_used);
        assert!(first.bubble_center.latitude.abs() < f64::EPSILON);
        assert!(first.bubble_center.longitude.abs() < f64::EPSILON);
        assert_eq!(first.uuid, first.uuid.to_uppercase());
        assert_eq!(first.uuid.len(), 36);
    }

    #[test]
    fn settings_update_is_partial_and_reread() {
        let db = Database::open_in_memory().unwrap();
        let created = db.get_or_create_settings().unwrap();

        let updated = db
            .update_settings(&SettingsUpdate {
                notification_interval_secs: Some(120),
                bubble_used: Some(true),
                bubble_center: Some(GeoPoint {
                    latitude: 32.88,
                    longitude: -117.23,
                }),
                ..SettingsUpdate::default()
            })
            .unwrap();

        assert_eq!(updated.uuid, created.uuid);
        assert_eq!(updated.max_stored_examples, created.max_stored_examples);
        assert_eq!(updated.notification_interval_secs, 120);
        assert!(updated.bubble_used);
        assert!((updated.bubble_center.latitude - 32.88).abs() < f64::EPSILON);

        let reread = db.get_or_create_settings().unwrap();
        assert_eq!(reread, updated);
    }

    #[test]
    fn empty_settings_update_is_a_read() {
        let db = Database::open_in_memory().unwrap();
        let created = db.get_or_create_settings().unwrap();
        let updated = db.update_settings(&SettingsUpdate::default()).unwrap();
        assert_eq!(updated, created);
    }

    #[test]
    fn settings_update_creates_the_row_when_missing() {
        let db = Database::open_in_memory().unwrap();
        let updated = db
            .update_settings(&SettingsUpdate {
                home_sensing: Some(true),
                ..SettingsUpdate::default()
            })
            .unwrap();
        assert!(updated.home_sensing);
        assert_eq!(updated.max_stored_examples, DEFAULT_MAX_STORED_EXAMPLES);
    }

    #[test]
    fn mutations_broadcast_change_events() {
        let db = Database::open_in_memory().unwrap();
        let mut rx = db.subscribe();

        let mut record = db.create_record(minute(10)).unwrap();
        assert!(rx.try_recv().is_ok());

        db.set_values(&mut record, user_update("walking"), false)
            .unwrap();
        assert!(rx.try_recv().is_ok());

        db.delete_record(minute(10)).unwrap();
        assert!(rx.try_recv().is_ok());

        // Deleting nothing changes nothing.
        db.delete_record(minute(10)).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reclaim_notifies_once_only_when_something_was_deleted() {
        let db = Database::open_in_memory().unwrap();
        db.create_record(minute(10)).unwrap();
        db.create_record(minute(11)).unwrap();

        let mut rx = db.subscribe();
        let artifacts = FixedArtifacts::for_minutes(&[]);
        let stats = db
            .reclaim_orphans_at(minute(0), &artifacts, minute(100))
            .unwrap();
        assert_eq!(stats.deleted, 2);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        // Nothing left to delete, so nothing to announce.
        db.reclaim_orphans_at(minute(0), &artifacts, minute(100))
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn open_creates_database_file_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minlog.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_record(minute(10)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.fetch_record(minute(10)).unwrap().is_some());
    }
}
