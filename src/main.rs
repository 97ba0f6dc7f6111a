use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ChangesCommand, ConfigCommand, DeleteCommand, ShowCommand, ShowPlateCommand};
use tramcan_sync::config::Config;
use tramcan_sync::db::{init_db, EntityStore};

#[derive(Parser)]
#[command(name = "tramcan")]
#[command(version)]
#[command(about = "Inspect and maintain the shared weighing station store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List records changed after a point in time
    Changes(ChangesCommand),

    /// Show one live record
    Show(ShowCommand),

    /// Look up a vehicle by plate number
    ShowPlate(ShowPlateCommand),

    /// Mark a record as deleted
    Delete(DeleteCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let pool = init_db(&config.database_path.value, config.max_connections.value).await?;
    let store = EntityStore::new(pool);

    match command {
        Commands::Changes(cmd) => cmd.run(&store).await?,
        Commands::Show(cmd) => cmd.run(&store).await?,
        Commands::ShowPlate(cmd) => cmd.run(&store).await?,
        Commands::Delete(cmd) => cmd.run(&store).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}
