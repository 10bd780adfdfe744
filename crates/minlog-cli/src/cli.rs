//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use minlog_core::LabelKind;

/// Minute-resolution activity log.
///
/// Keeps one labeled record per recorded minute, merges consecutive
/// minutes into continuous activities, and reclaims abandoned recordings.
#[derive(Debug, Parser)]
#[command(name = "minlog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start recording a minute: create its blank record.
    Record {
        /// Minute to record (epoch seconds or RFC 3339); defaults to now.
        /// Floored to the minute boundary.
        #[arg(long)]
        at: Option<String>,
    },

    /// Apply a user labeling to a recorded minute.
    Label {
        /// The minute to label (epoch seconds or RFC 3339).
        timestamp: String,

        /// Main activity label.
        #[arg(long)]
        main: Option<String>,

        /// Secondary activity label; repeat for several.
        #[arg(long)]
        secondary: Vec<String>,

        /// Mood label; repeat for several.
        #[arg(long)]
        mood: Vec<String>,

        /// Keep the stored server prediction instead of clearing it.
        #[arg(long)]
        keep_server_prediction: bool,

        /// Skip the feedback submission for this labeling.
        #[arg(long)]
        no_feedback: bool,
    },

    /// Apply a server prediction to a recorded minute.
    Predict {
        /// The minute to predict (epoch seconds or RFC 3339).
        timestamp: String,

        /// Predicted main activity label.
        label: String,
    },

    /// Show continuous activities in a time range.
    Timeline {
        /// Start of the range (epoch seconds or RFC 3339), inclusive.
        #[arg(long)]
        from: String,

        /// End of the range (epoch seconds or RFC 3339), inclusive.
        #[arg(long)]
        to: String,

        /// Treat the whole range as one activity, ignoring gaps and
        /// label changes.
        #[arg(long, conflicts_with = "split")]
        single: bool,

        /// Show one entry per minute instead of merged activities.
        #[arg(long)]
        split: bool,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Rank labels by how often they occur.
    Labels {
        /// Which label set to count.
        #[arg(long, default_value = "main")]
        kind: LabelKind,

        /// Only count minutes at or after this time (epoch seconds or
        /// RFC 3339); defaults to all of history.
        #[arg(long)]
        since: Option<String>,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Delete abandoned recordings with no prediction and no artifact.
    Reclaim {
        /// Only consider minutes at or after this time (epoch seconds or
        /// RFC 3339); defaults to all of history.
        #[arg(long)]
        from: Option<String>,
    },

    /// Show or change the stored settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Delete the record for a minute.
    Delete {
        /// The minute to delete (epoch seconds or RFC 3339).
        timestamp: String,
    },

    /// Show store location and recording summary.
    Status,
}

/// Settings subcommands.
#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Show the current settings.
    Show {
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Change one or more settings fields.
    Set {
        /// Cap on locally stored sensor examples.
        #[arg(long)]
        max_stored: Option<i64>,

        /// Seconds between activity notifications.
        #[arg(long)]
        notify_interval: Option<i64>,

        /// Enable or disable location-based home sensing.
        #[arg(long)]
        home_sensing: Option<bool>,

        /// Enable or disable the location bubble.
        #[arg(long)]
        bubble: Option<bool>,

        /// Center of the location bubble as "LAT,LON".
        #[arg(long)]
        bubble_center: Option<String>,
    },
}
