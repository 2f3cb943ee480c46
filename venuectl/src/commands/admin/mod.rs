//! Commands for administration of the database itself
use crate::cli::AdminCommands;
use anyhow::Result;
use std::path::PathBuf;

mod database;
mod user;

/// Handle the `venuectl admin` command and its subcommands
pub(crate) async fn handle_command(dbpath: PathBuf, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Users { command } => user::handle_command(dbpath, command).await,
        AdminCommands::Database { command } => database::handle_command(dbpath, command).await,
    }
}
