use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemBlobStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cookbook_server::config::AppConfig;
use cookbook_server::database::init_db;
use cookbook_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let blob_store = FilesystemBlobStore::unconfigured(config.storage.max_blob_size);
    blob_store
        .configure(config.storage.dir.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to open image store at {}",
                config.storage.dir.display()
            )
        })?;
    info!(dir = %config.storage.dir.display(), "Image store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        config: Arc::new(config),
    };
    let app = cookbook_server::build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
