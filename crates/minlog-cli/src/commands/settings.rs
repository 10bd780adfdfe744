//! Settings commands: show and change the singleton settings row.

use std::io::Write;

use anyhow::{Context, Result};

use minlog_db::{Database, GeoPoint, Settings, SettingsUpdate};

pub fn show<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let settings = db.get_or_create_settings()?;
    render(writer, &settings, json)
}

/// Field changes requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct SetArgs {
    pub max_stored: Option<i64>,
    pub notify_interval: Option<i64>,
    pub home_sensing: Option<bool>,
    pub bubble: Option<bool>,
    pub bubble_center: Option<String>,
}

pub fn set<W: Write>(writer: &mut W, db: &Database, args: SetArgs) -> Result<()> {
    let update = SettingsUpdate {
        max_stored_examples: args.max_stored,
        notification_interval_secs: args.notify_interval,
        home_sensing: args.home_sensing,
        bubble_used: args.bubble,
        bubble_center: args.bubble_center.as_deref().map(parse_point).transpose()?,
    };
    if update.is_empty() {
        anyhow::bail!("nothing to change; pass at least one settings flag");
    }

    let settings = db.update_settings(&update)?;
    render(writer, &settings, false)
}

fn render<W: Write>(writer: &mut W, settings: &Settings, json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(settings)?)?;
        return Ok(());
    }
    writeln!(writer, "uuid:                {}", settings.uuid)?;
    writeln!(writer, "max stored examples: {}", settings.max_stored_examples)?;
    writeln!(
        writer,
        "notify interval:     {} s",
        settings.notification_interval_secs
    )?;
    writeln!(writer, "home sensing:        {}", settings.home_sensing)?;
    writeln!(writer, "bubble used:         {}", settings.bubble_used)?;
    writeln!(
        writer,
        "bubble center:       {}, {}",
        settings.bubble_center.latitude, settings.bubble_center.longitude
    )?;
    Ok(())
}

/// Parses "LAT,LON" into a point.
fn parse_point(s: &str) -> Result<GeoPoint> {
    let (lat, lon) = s
        .split_once(',')
        .context("bubble center must be LAT,LON")?;
    Ok(GeoPoint {
        latitude: lat
            .trim()
            .parse()
            .with_context(|| format!("invalid latitude: {lat}"))?,
        longitude: lon
            .trim()
            .parse()
            .with_context(|| format!("invalid longitude: {lon}"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_creates_the_row_and_is_stable() {
        let db = Database::open_in_memory().unwrap();

        let mut first = Vec::new();
        show(&mut first, &db, false).unwrap();
        let mut second = Vec::new();
        show(&mut second, &db, false).unwrap();

        // Same UUID both times: the row is created exactly once.
        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.contains("max stored examples: 600"));
        assert!(text.contains("notify interval:     600 s"));
    }

    #[test]
    fn set_changes_only_named_fields() {
        let db = Database::open_in_memory().unwrap();
        let before = db.get_or_create_settings().unwrap();

        let mut output = Vec::new();
        set(
            &mut output,
            &db,
            SetArgs {
                notify_interval: Some(120),
                bubble: Some(true),
                bubble_center: Some("32.88,-117.23".to_string()),
                ..SetArgs::default()
            },
        )
        .unwrap();

        let after = db.get_or_create_settings().unwrap();
        assert_eq!(after.uuid, before.uuid);
        assert_eq!(after.max_stored_examples, before.max_stored_examples);
        assert_eq!(after.notification_interval_secs, 120);
        assert!(after.bubble_used);
        assert!((after.bubble_center.latitude - 32.88).abs() < f64::EPSILON);
        assert!((after.bubble_center.longitude + 117.23).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_set_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = set(&mut output, &db, SetArgs::default()).unwrap_err();
        assert!(err.to_string().contains("nothing to change"));
    }

    #[test]
    fn bad_bubble_center_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = set(
            &mut output,
            &db,
            SetArgs {
                bubble_center: Some("north-ish".to_string()),
                ..SetArgs::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("LAT,LON"));
    }

    #[test]
    fn json_show_includes_every_field() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        show(&mut output, &db, true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["max_stored_examples"], 600);
        assert_eq!(parsed["home_sensing"], false);
        assert!(parsed["uuid"].as_str().unwrap().len() == 36);
    }
}
