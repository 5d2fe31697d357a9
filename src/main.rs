use clap::Parser;
use log::info;
use std::path::PathBuf;

use coursehub::config::AppConfig;
use coursehub::core::shared::utils::{create_conn, redact_database_url, run_migrations};
use coursehub::{run_server, AppState, InMemoryCatalogStore, PgCatalogStore};

#[derive(Debug, Parser)]
#[command(name = "coursehub", version, about = "Online course catalog and enrollment backend")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "COURSEHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Keep all data in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if cli.in_memory {
        info!("Starting with the in-memory store; data is lost on exit");
        let state = AppState::new(config, InMemoryCatalogStore::new());
        run_server(state).await?;
    } else {
        info!("Connecting to {}", redact_database_url(&config.database.url));
        let pool = create_conn(&config.database)?;
        run_migrations(&pool)?;
        let state = AppState::new(config, PgCatalogStore::new(pool));
        run_server(state).await?;
    }

    info!("coursehub stopped");
    Ok(())
}
