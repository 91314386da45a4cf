//! Clinic CLI - Command-line interface for clinic patient records.

use clap::Parser;
use clinic_cli::commands;
use clinic_cli::{Cli, Command, Config, Formatter};
use clinic_store::SqliteStore;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> clinic_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    init_tracing(&config.log_level);
    debug!(path = %config_path.display(), "Configuration loaded");

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        Command::Config(args) => {
            commands::execute_config(args, &mut config, &config_path, &formatter)?;
        }
        cmd => {
            // Commands that need the database
            let database = cli
                .database
                .map(PathBuf::from)
                .unwrap_or_else(|| config.database_path.clone());
            if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            debug!(path = %database.display(), "Opening database");
            let mut store = SqliteStore::new(&database)?;

            match cmd {
                Command::Patient(args) => {
                    commands::execute_patient(args, &mut store, config.search_limit, &formatter)?;
                }
                Command::Sibling(args) => {
                    commands::execute_sibling(args, &mut store, &formatter)?;
                }
                Command::Visit(args) => {
                    commands::execute_visit(args, &mut store, &formatter)?;
                }
                Command::Config(_) => unreachable!(),
            }
        }
    }

    Ok(())
}

/// Log to stderr. `CLINIC_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("CLINIC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
