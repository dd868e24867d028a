use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use car_doctor_api::cli::Cli;
use car_doctor_api::config::{self, StoreBackend};
use car_doctor_api::database::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use car_doctor_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up ACCESS_TOKEN_SECRET, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::config().clone();
    cli.apply(&mut config);
    config.validate()?;

    tracing::info!(
        "Starting Car Doctor API in {:?} mode with {:?} store",
        config.environment,
        config.store.backend
    );

    let store = connect_store(&config, &cli).await?;

    // The store is closed whether or not the server exits cleanly
    let served = serve(store.clone(), &config).await;
    store.close().await;
    served
}

async fn connect_store(config: &config::AppConfig, cli: &Cli) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let collections = &config.store.collections;

    match config.store.backend {
        StoreBackend::Memory => {
            let store = MemoryDocumentStore::new();
            if let Some(path) = &cli.seed {
                let count = store
                    .seed_from_file(path)
                    .await
                    .with_context(|| format!("failed to seed from {}", path.display()))?;
                tracing::info!("Loaded {} seed documents", count);
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            if cli.seed.is_some() {
                tracing::warn!("--seed is ignored for the postgres store");
            }
            let url = config
                .store
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let store = PgDocumentStore::connect(
                url,
                config.store.max_connections,
                config.store.connection_timeout,
            )
            .await?;
            store
                .ensure_collections(&[
                    collections.services.as_str(),
                    collections.products.as_str(),
                    collections.bookings.as_str(),
                ])
                .await?;
            store.ping().await?;
            tracing::info!("Pinged document store; connection is healthy");
            Ok(Arc::new(store))
        }
    }
}

async fn serve(store: Arc<dyn DocumentStore>, config: &config::AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(store, config);
    let app = app(state, &config.security.cors_origins);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
