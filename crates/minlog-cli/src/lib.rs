//! Minute activity log CLI library.
//!
//! This crate provides the CLI interface for the minute activity log.

mod artifacts;
mod cli;
pub mod commands;
mod config;
mod spool;

pub use artifacts::DirArtifacts;
pub use cli::{Cli, Commands, SettingsAction};
pub use config::Config;
pub use spool::JsonlSpool;
