//! CLI subcommand implementations.

pub mod delete;
pub mod label;
pub mod labels;
pub mod predict;
pub mod reclaim;
pub mod record;
pub mod settings;
pub mod status;
pub mod timeline;
pub mod util;
