//! This is a command-line tool to manage and query a venue database via [libvenue]
use crate::cli::{Cli, Commands};
use anyhow::{Result, anyhow};
use clap::Parser;
use directories::ProjectDirs;
use libvenue::Database;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

/// The database used by the web service when it runs with its default
/// configuration
fn default_database() -> Result<PathBuf> {
    ProjectDirs::from("org", "venues", "venueweb")
        .map(|dirs| dirs.data_dir().join("venues.sqlite"))
        .ok_or_else(|| anyhow!("Unable to determine a default database path"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("VENUECTL_LOG"))
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();
    let dbpath = match args.database {
        Some(path) => path,
        None => default_database()?,
    };
    debug!(?dbpath, "Using database");

    match args.command {
        Commands::Admin { command } => commands::admin::handle_command(dbpath, command).await,
        Commands::Locations { command } => {
            let db = Database::open(&dbpath).await?;
            commands::locations::handle_command(command, &db).await
        }
        Commands::Events { command } => {
            let db = Database::open(&dbpath).await?;
            commands::events::handle_command(command, &db).await
        }
    }
}
