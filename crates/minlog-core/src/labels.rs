//! Label vocabulary: who supplied a label and which set it belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for the label vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// A stored label-source code had no known meaning.
    #[error("unknown label source code: {0}")]
    UnknownSourceCode(i64),

    /// A label-source name did not match any variant.
    #[error("unknown label source: {0}")]
    UnknownSource(String),

    /// A label-kind name did not match any variant.
    #[error("unknown label kind: {0}")]
    UnknownKind(String),
}

/// Provenance of a record's main-activity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// Freshly created, nothing assigned yet.
    #[default]
    Default,
    /// Assigned by the prediction service.
    ServerPrediction,
    /// Corrected or confirmed by the user.
    UserCorrected,
}

impl LabelSource {
    /// Integer code for database storage.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Default => 0,
            Self::ServerPrediction => 1,
            Self::UserCorrected => 2,
        }
    }

    /// Decodes a stored integer code.
    pub const fn from_code(code: i64) -> Result<Self, LabelError> {
        match code {
            0 => Ok(Self::Default),
            1 => Ok(Self::ServerPrediction),
            2 => Ok(Self::UserCorrected),
            other => Err(LabelError::UnknownSourceCode(other)),
        }
    }

    /// String representation used in CLI output and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ServerPrediction => "server_prediction",
            Self::UserCorrected => "user_corrected",
        }
    }
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LabelSource {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "server_prediction" => Ok(Self::ServerPrediction),
            "user_corrected" => Ok(Self::UserCorrected),
            _ => Err(LabelError::UnknownSource(s.to_string())),
        }
    }
}

/// Which of a record's three label sets an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// The single main activity.
    Main,
    /// Additional activities happening alongside the main one.
    Secondary,
    /// How the user felt.
    Mood,
}

impl LabelKind {
    /// String representation used in CLI arguments and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Secondary => "secondary",
            Self::Mood => "mood",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LabelKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "secondary" => Ok(Self::Secondary),
            "mood" => Ok(Self::Mood),
            _ => Err(LabelError::UnknownKind(s.to_string())),
        }
    }
}

/// Joins labels into the comma-separated storage form.
///
/// The empty set becomes the empty string. Labels must not themselves
/// contain commas; the store does not escape them.
#[must_use]
pub fn join_labels(labels: &[String]) -> String {
    labels.join(",")
}

/// Splits the comma-separated storage form back into labels.
///
/// The empty string becomes the empty set, making this the exact inverse
/// of [`join_labels`]. A naive split would turn `""` into one empty label.
#[must_use]
pub fn split_labels(csv: &str) -> Vec<String> {
    if csv.is_empty() {
        return Vec::new();
    }
    csv.split(',').map(str::to_string).collect()
}
