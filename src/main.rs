use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use profile_api::auth::{Authenticator, HttpIdentityOracle};
use profile_api::config::AppConfig;
use profile_api::database::{manager, InMemoryProfileStore, PgProfileStore, ProfileStore};
use profile_api::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "profile-api-rust", version, about = "Profile CRUD API with oracle-verified access control")]
struct Cli {
    /// Port to listen on (overrides PROFILE_API_PORT / PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Keep profiles in process memory instead of Postgres
    #[arg(long)]
    memory_store: bool,

    /// Do not create the profiles table on startup
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ORACLE_BASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Profile API in {:?} mode", config.environment);

    let oracle = HttpIdentityOracle::from_config(&config.oracle)?;
    tracing::info!("Identity oracle: {}", oracle.endpoint());
    let authenticator = Authenticator::new(Arc::new(oracle));

    let store: Arc<dyn ProfileStore> = if cli.memory_store {
        tracing::warn!("Using in-memory profile store; data is lost on exit");
        Arc::new(InMemoryProfileStore::new())
    } else {
        let pool = manager::connect(&config.database).await?;
        let store = PgProfileStore::new(pool);
        if !cli.skip_migrations {
            store.ensure_schema().await?;
        }
        Arc::new(store)
    };

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, authenticator, store);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Profile API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Profile API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
