//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Directory holding raw sensor artifacts, one `<secs>.zip` per
    /// recorded minute.
    pub artifacts_dir: PathBuf,

    /// JSONL file that queues label feedback for later submission.
    pub feedback_spool: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("artifacts_dir", &self.artifacts_dir)
            .field("feedback_spool", &self.feedback_spool)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("minlog.db"),
            artifacts_dir: data_dir.join("artifacts"),
            feedback_spool: data_dir.join("feedback.jsonl"),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MINLOG_*)
        figment = figment.merge(Env::prefixed("MINLOG_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for minlog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("minlog"))
}

/// Returns the platform-specific data directory for minlog.
///
/// On Linux: `~/.local/share/minlog`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("minlog"))
}
