//! Minute-resolution timestamps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds covered by one recorded minute of activity.
pub const GRANULE_SECS: i64 = 60;

/// A point in time with whole-second precision, counted from the Unix epoch.
///
/// Activity is recorded once per minute, so producers floor to the minute
/// boundary before storing. The type itself never truncates and all
/// arithmetic is plain seconds; serialized form is the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeGranule(i64);

impl TimeGranule {
    /// The earliest representable granule, for open-ended lower bounds.
    pub const MIN: Self = Self(i64::MIN);

    /// Creates a granule from seconds since the Unix epoch.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Truncates to the start of the containing minute.
    #[must_use]
    pub const fn floor_to_minute(self) -> Self {
        Self(self.0 - self.0.rem_euclid(GRANULE_SECS))
    }

    /// The granule exactly one minute later.
    #[must_use]
    pub const fn minute_after(self) -> Self {
        Self(self.0 + GRANULE_SECS)
    }

    /// Shifts by a signed number of seconds.
    #[must_use]
    pub const fn offset_secs(self, secs: i64) -> Self {
        Self(self.0 + secs)
    }

    /// Signed seconds elapsed since `earlier`.
    #[must_use]
    pub const fn secs_since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }

    /// Whether `self` falls exactly one minute after `earlier`.
    ///
    /// Gaps and overlaps both fail this test; it is the contiguity check
    /// used when merging records into segments.
    #[must_use]
    pub const fn is_minute_after(self, earlier: Self) -> bool {
        self.secs_since(earlier) == GRANULE_SECS
    }

    /// Converts to a chrono UTC datetime.
    ///
    /// Returns `None` for values outside chrono's representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<DateTime<Utc>> for TimeGranule {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }
}

impl fmt::Display for TimeGranule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
