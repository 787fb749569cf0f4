use std::time::Duration;

use anyhow::{Context, Result};
use councillor::config::BotConfig;
use councillor::gateway::GatewayClient;
use councillor::resolver::VotingResolver;
use migration::MigratorTrait;
use sea_orm::ConnectOptions;
use sea_orm::Database;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = BotConfig::load().context("Failed to load configuration")?;
    let database = connect_database(&config).await?;
    run_migrations(&database).await?;

    let gateway = GatewayClient::new(&config.discord.token)
        .context("Failed to initialize Discord gateway client")?;

    // The interaction frontend builds its own AppState from this same
    // configuration; the daemon only drives the resolver.
    let resolver = VotingResolver::new(database.clone(), gateway, config.resolver.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let resolver_handle = tokio::spawn(async move {
        if let Err(err) = resolver.run(shutdown_rx).await {
            error!("Resolver terminated with error: {err}");
        }
    });

    info!("councillord running; voting resolution scheduled daily");
    shutdown_signal(shutdown_tx.clone()).await;

    shutdown_tx.send(true).ok();
    if let Err(join_err) = resolver_handle.await {
        error!("Resolver task join error: {join_err}");
    }

    Ok(())
}

fn init_tracing() {
    let default_filter = "info";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    assert!(!filter.is_empty(), "Tracing filter must not be empty");
    assert!(filter.len() < 256, "Tracing filter length exceeds bounds");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .init();
}

async fn connect_database(config: &BotConfig) -> Result<sea_orm::DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .acquire_timeout(Duration::from_secs(10));

    if let Some(min) = config.database.min_connections {
        options.min_connections(min);
    }

    assert!(
        config.database.max_connections >= config.database.min_connections.unwrap_or(1),
        "Max connections must be >= min connections"
    );
    assert!(
        config.database.max_connections <= 128,
        "Connection pool oversized"
    );

    Database::connect(options)
        .await
        .context("Failed to connect to PostgreSQL")
}

async fn run_migrations(database: &sea_orm::DatabaseConnection) -> Result<()> {
    migration::Migrator::up(database, None)
        .await
        .context("Database migrations failed")
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    shutdown_tx.send(true).ok();
    info!("Shutdown signal dispatched");
}
