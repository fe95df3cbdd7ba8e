use std::sync::Arc;

use encore_api::{
    api::{create_router, AppState},
    config::{Config, StorageBackend},
    db::{self, Cache, CacheWriterHandle},
    services::stores::{CachedCatalog, Catalog, InMemoryStore, LikeStore, PgStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("encore_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (catalog, likes) = build_stores(&config).await?;

    let (catalog, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let client = db::create_redis_client(redis_url)?;
            let (cache, handle) = Cache::new(client).await;
            tracing::info!("Catalog caching enabled");
            let catalog: Arc<dyn Catalog> = Arc::new(CachedCatalog::new(catalog, cache));
            (catalog, Some(handle))
        }
        None => (catalog, None),
    };

    let app = create_router(AppState::new(catalog, likes));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, storage = ?config.storage, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_cache(cache_handle).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn build_stores(config: &Config) -> anyhow::Result<(Arc<dyn Catalog>, Arc<dyn LikeStore>)> {
    match config.storage {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url, config.max_connections).await?;
            db::run_migrations(&pool).await?;
            if config.seed_catalog {
                db::seed::seed_catalog(&pool).await?;
            }
            let store = Arc::new(PgStore::new(pool));
            let catalog: Arc<dyn Catalog> = store.clone();
            let likes: Arc<dyn LikeStore> = store;
            Ok((catalog, likes))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on exit");
            let store = Arc::new(InMemoryStore::demo().await);
            let catalog: Arc<dyn Catalog> = store.clone();
            let likes: Arc<dyn LikeStore> = store;
            Ok((catalog, likes))
        }
    }
}

async fn shutdown_cache(handle: Option<CacheWriterHandle>) {
    if let Some(handle) = handle {
        handle.shutdown().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
