use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::server;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "jobly-api")]
#[command(about = "Jobly API - job board JSON backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT / JOBLY_API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let state = AppState::from_config(config).await?;
            server::listen(state, config, port.unwrap_or(config.api.port)).await
        }
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            println!("Migrations applied successfully");
            Ok(())
        }
    }
}
