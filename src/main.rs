mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    catalog::CatalogCommands, config::ConfigArgs, snapshot::SnapshotCommands, system::DestroyArgs,
};

#[derive(Parser)]
#[command(author, version, about = "snapdbx snapshot-store CLI")]
struct Cli {
    /// Path to the configuration file. Defaults to ./.snapdbx/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and query per-app snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
    /// Manage the tracked-app catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Show or update system configuration
    Config(ConfigArgs),
    /// Display store status
    Status,
    /// Destroy all snapdbx data and configuration
    Destroy(DestroyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    snapdbx::logging::init()?;

    let Cli { config, command } = Cli::parse();

    match command {
        Commands::Snapshot { command } => commands::snapshot::execute(config, command)?,
        Commands::Catalog { command } => commands::catalog::execute(config, command).await?,
        Commands::Config(args) => commands::config::execute(config, args)?,
        Commands::Status => commands::system::status(config)?,
        Commands::Destroy(args) => commands::system::destroy(config, args)?,
    }

    Ok(())
}
