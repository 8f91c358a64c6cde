//! skinvault CLI - open cases and manage an offline-first skin inventory
//!
//! Draws work without a network connection; queued draws are committed the
//! next time the remote is reachable.

mod cli;
mod commands;
mod config_profiles;
mod error;
mod remote;


use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::cases::run_cases;
use crate::commands::common::{resolve_db_path, resolve_settings};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::run_export;
use crate::commands::inventory::run_inventory;
use crate::commands::open::run_open;
use crate::commands::pending::run_pending;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Config { command } => return run_config(command, cli.profile.as_deref()),
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        _ => {}
    }

    let db_path = resolve_db_path(cli.db_path);
    let settings = resolve_settings(cli.user.as_deref(), cli.profile.as_deref())?;
    tracing::debug!(
        "Using profile '{}' with database {}",
        settings.profile_name,
        db_path.display()
    );

    match command {
        Commands::Open { case_id, json } => run_open(&case_id, json, &db_path, &settings).await,
        Commands::Inventory { json } => run_inventory(json, &db_path, &settings).await,
        Commands::Cases { refresh, json } => run_cases(refresh, json, &db_path, &settings).await,
        Commands::Sync => run_sync(&db_path, &settings).await,
        Commands::Status { json } => run_status(json, &db_path, &settings).await,
        Commands::Pending { json } => run_pending(json, &db_path, &settings).await,
        Commands::Watch => run_watch(&db_path, &settings).await,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &db_path, &settings).await
        }
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match "skinvault=info".parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(error) => eprintln!("Ignoring invalid log directive: {error}"),
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
