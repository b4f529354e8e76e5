use clap::Parser;
use jobly_api::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and SECRET_KEY can live there
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobly_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = jobly_api::config::config();
    tracing::info!("Starting Jobly API in {:?} mode", config.environment);

    if jobly_api::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECRET_KEY must be set in production");
    }

    jobly_api::cli::run(cli, config).await
}
