//! todo-api server binary

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_api::api::{create_router, AppState};
use todo_api::config::{AppConfig, LogFormat};
use todo_api::store::{create_store, verify_connection, DisconnectedStore, TodoStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables from a local .env file; the process environment still wins
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    let store = build_store(&config).await;

    // Reachability is only reported; requests fail individually while the store is down
    let ping_store = store.clone();
    tokio::spawn(async move {
        let _ = verify_connection(ping_store.as_ref()).await;
    });

    let router = create_router(AppState::new(store));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "Server is running");

    axum::serve(listener, router).await?;

    Ok(())
}

async fn build_store(config: &AppConfig) -> Arc<dyn TodoStore> {
    match create_store(config.store_runtime()).await {
        Ok(store) => {
            tracing::info!(backend = store.backend_name(), "Store initialised");
            Arc::from(store)
        }
        Err(err) => {
            tracing::error!(error = %err, "Store initialisation failed; serving without a store");
            Arc::new(DisconnectedStore::new(err.to_string()))
        }
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("todo_api=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    Ok(())
}
