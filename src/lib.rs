pub mod catalog;
pub mod config;
pub mod controllers;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod search;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{Config, StorageConfig};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::store::{FileStore, MemoryStore, PgStore, ReservationStore};

// Shared state для всего приложения
pub struct AppState {
    pub ledger: Ledger,
    pub config: Config,
}

impl AppState {
    /// Открывает хранилище по конфигурации и загружает леджер.
    pub async fn new(config: Config) -> Result<Arc<Self>, LedgerError> {
        let store: Arc<dyn ReservationStore> = match &config.storage {
            StorageConfig::Memory => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
            StorageConfig::File { path } => {
                info!("Using file storage at {}", path.display());
                Arc::new(FileStore::open(path.clone()).await?)
            }
            StorageConfig::Postgres { url, pool_size } => {
                let store = PgStore::connect(url, *pool_size).await?;
                info!("Database connected");
                store.run_migrations().await?;
                Arc::new(store)
            }
        };

        let fallback = match &config.catalog.path {
            Some(path) => {
                info!("Loading catalog from {}", path.display());
                Catalog::from_json_file(path).await?
            }
            None => Catalog::demo(),
        };

        let ledger = Ledger::load(store, fallback, config.pricing).await?;
        Ok(Self::with_ledger(ledger, config))
    }

    pub fn with_ledger(ledger: Ledger, config: Config) -> Arc<Self> {
        Arc::new(Self { ledger, config })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Movie Tickets API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
