use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use minlog_cli::commands::{
    delete, label, labels, predict, reclaim, record, settings, status, timeline,
};
use minlog_cli::{Cli, Commands, Config, DirArtifacts, JsonlSpool, SettingsAction};

/// Load config and open the database, ensuring the parent directory
/// exists and wiring up the feedback spool.
fn open_database(config_path: Option<&Path>) -> Result<(minlog_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = minlog_db::Database::open(&config.database_path)
        .context("failed to open database")?
        .with_feedback_sink(Box::new(JsonlSpool::new(config.feedback_spool.clone())));
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Some(Commands::Record { at }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            record::run(&mut stdout, &db, at.as_deref())?;
        }
        Some(Commands::Label {
            timestamp,
            main,
            secondary,
            mood,
            keep_server_prediction,
            no_feedback,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            label::run(
                &mut stdout,
                &db,
                label::LabelArgs {
                    timestamp,
                    main,
                    secondary,
                    mood,
                    keep_server_prediction,
                    no_feedback,
                },
            )?;
        }
        Some(Commands::Predict { timestamp, label }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            predict::run(&mut stdout, &db, &timestamp, &label)?;
        }
        Some(Commands::Timeline {
            from,
            to,
            single,
            split,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let grouping = if single {
                timeline::Grouping::Single
            } else if split {
                timeline::Grouping::PerMinute
            } else {
                timeline::Grouping::Merged
            };
            timeline::run(&mut stdout, &db, &from, &to, grouping, json)?;
        }
        Some(Commands::Labels { kind, since, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            labels::run(&mut stdout, &db, kind, since.as_deref(), json)?;
        }
        Some(Commands::Reclaim { from }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let artifacts = DirArtifacts::new(config.artifacts_dir.clone());
            reclaim::run(&mut stdout, &db, &artifacts, from.as_deref())?;
        }
        Some(Commands::Settings { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                SettingsAction::Show { json } => settings::show(&mut stdout, &db, json)?,
                SettingsAction::Set {
                    max_stored,
                    notify_interval,
                    home_sensing,
                    bubble,
                    bubble_center,
                } => settings::set(
                    &mut stdout,
                    &db,
                    settings::SetArgs {
                        max_stored,
                        notify_interval,
                        home_sensing,
                        bubble,
                        bubble_center,
                    },
                )?,
            }
        }
        Some(Commands::Delete { timestamp }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            delete::run(&mut stdout, &db, &timestamp)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut stdout, &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
