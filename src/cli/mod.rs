use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::auth::verifier_from_config;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgVersionStore, StoreError, VersionStore};
use crate::middleware::CorsPolicy;
use crate::routes;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "profile-history")]
#[command(about = "Versioned JSON profile storage API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Serve the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT / PROFILE_API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create the profile_history table")]
    Install,
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Install => install(config).await,
    }
}

async fn serve(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let store = Arc::new(PgVersionStore::new(pool.clone()));
    let verifier = verifier_from_config(&config.identity).context("failed to build identity verifier")?;
    let cors = CorsPolicy::new(config.security.cors_origins.iter().cloned());

    let state = AppState::new(store, verifier, cors);
    let app = routes::app(state, &config.server);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "Profile history API listening on http://{}{}",
        bind_addr,
        config.server.api_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(&pool).await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn install(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let store = PgVersionStore::new(pool.clone());

    let result = store.install().await;
    DatabaseManager::close(&pool).await;

    match result {
        Ok(()) => {
            println!("profile_history table created");
            Ok(())
        }
        Err(StoreError::AlreadyInstalled) => {
            anyhow::bail!("the profile_history table already exists, installation was performed earlier")
        }
        Err(e) => Err(e).context("installation failed"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
