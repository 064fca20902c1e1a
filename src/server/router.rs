use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::keys::keys_router;
use super::storage::storage_router;
use crate::auth::KeyStore;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::storage::{BucketRegistry, ObjectStore};
use crate::store::{SqliteStore, Store};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub keys: KeyStore,
    pub buckets: Arc<BucketRegistry>,
    pub objects: ObjectStore,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Wires the services over an already initialized store.
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        let buckets = Arc::new(
            BucketRegistry::new(store.clone(), config.storage_root())
                .with_default_region(&config.default_region),
        );
        let objects = ObjectStore::new(buckets.clone(), config.tmp_dir())
            .with_max_upload_bytes(config.max_upload_bytes);

        Self {
            keys: KeyStore::new(store.clone(), &config.master_key),
            store,
            buckets,
            objects,
            data_dir: config.data_dir.clone(),
        }
    }

    /// Opens (or creates) the catalog under `data_dir` and the storage
    /// directories next to it.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        std::fs::create_dir_all(config.storage_root())?;
        std::fs::create_dir_all(config.tmp_dir())?;

        let store = SqliteStore::new(config.db_path())?;
        store.initialize()?;

        Ok(Self::new(Arc::new(store), config))
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.objects.max_upload_bytes();

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/auth", keys_router())
        .nest("/api/v1/storage", storage_router(upload_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
