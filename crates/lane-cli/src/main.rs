use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lane_cli::commands::{
    averages, capture, catalog, check, compare, consistency, history, results, status, time, top,
};
use lane_cli::{CatalogAction, Cli, Commands, Config, TimeAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<lane_db::Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    lane_db::Database::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Time { action }) => match action {
            TimeAction::Parse { value } => time::parse(&mut out, value)?,
            TimeAction::Format { centiseconds } => time::format(&mut out, *centiseconds)?,
        },
        Some(Commands::Check { file, json }) => {
            let config = load_config(cli.config.as_deref())?;
            check::run(&mut out, file, *json, &config.commit_config())?;
        }
        Some(Commands::Consistency { times, json }) => {
            let config = load_config(cli.config.as_deref())?;
            consistency::run(&mut out, times, *json, &config.consistency)?;
        }
        Some(Commands::Catalog { action }) => {
            let config = load_config(cli.config.as_deref())?;
            let mut db = open_database(&config)?;
            match action {
                CatalogAction::Import { file } => catalog::import(&mut out, &mut db, file)?,
                CatalogAction::List => catalog::list(&mut out, &db)?,
            }
        }
        Some(Commands::Capture { script, draft_id }) => {
            let config = load_config(cli.config.as_deref())?;
            let mut db = open_database(&config)?;
            capture::run(&mut out, &mut db, script, draft_id.as_deref(), &config)?;
        }
        Some(Commands::Results { json }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            results::run(&mut out, &db, *json)?;
        }
        Some(Commands::Compare {
            first,
            second,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            compare::run(&mut out, &db, *first, *second, *json)?;
        }
        Some(Commands::History {
            swimmer,
            event,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            history::run(&mut out, &db, swimmer, event, *json, &config.consistency)?;
        }
        Some(Commands::Averages { filter, json }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            averages::run(&mut out, &db, &filter.to_filter(), *json)?;
        }
        Some(Commands::Top {
            filter,
            limit,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            top::run(&mut out, &db, &filter.to_filter(), *limit, *json)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            status::run(&mut out, &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
