//! Shared utilities for CLI commands.

use chrono::{DateTime, SecondsFormat, Utc};

use minlog_core::TimeGranule;

/// Parses a timestamp argument as epoch seconds or RFC 3339.
pub fn parse_granule(s: &str) -> anyhow::Result<TimeGranule> {
    if let Ok(secs) = s.parse::<i64>() {
        return Ok(TimeGranule::from_secs(secs));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(TimeGranule::from(dt.with_timezone(&Utc)));
    }
    anyhow::bail!(
        "invalid timestamp: {s}. Use epoch seconds (e.g., 1735689600) or RFC 3339 (e.g., 2025-01-01T00:00:00Z)"
    )
}

/// Renders a granule for humans: RFC 3339 when representable, raw
/// seconds otherwise.
#[must_use]
pub fn format_granule(granule: TimeGranule) -> String {
    granule.to_datetime().map_or_else(
        || granule.as_secs().to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
