use crate::config::{ContentConfig, SolarConfig, StoreBackend};
use crate::handlers;
use crate::models::ContentType;
use crate::services::{ContentStore, MemoryStore, MongoDb};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use solar_calculator::RegionTable;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ContentConfig,
    pub store: Arc<dyn ContentStore>,
    pub regions: Arc<RegionTable>,
}

/// All HTTP routes with the shared middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/content/:content", get(handlers::list_content))
        .route("/api/content/:content/:id", get(handlers::get_content))
        .route("/api/solar/estimate", post(handlers::estimate_solar))
        .route("/api/solar/regions", get(handlers::list_regions))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ContentConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Builds the server around an already constructed store.
    pub async fn build_with_store(
        config: ContentConfig,
        store: Arc<dyn ContentStore>,
    ) -> Result<Self, AppError> {
        let regions = Arc::new(load_regions(&config.solar)?);

        let state = AppState {
            config: config.clone(),
            store,
            regions,
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn connect_store(config: &ContentConfig) -> Result<Arc<dyn ContentStore>, AppError> {
    match config.store.backend {
        StoreBackend::Mongo => {
            let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            db.initialize_indexes(&ContentType::ALL).await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            let store = match &config.store.seed_path {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };
            tracing::info!("Using in-memory content store");
            Ok(Arc::new(store))
        }
    }
}

fn load_regions(config: &SolarConfig) -> Result<RegionTable, AppError> {
    let table = match &config.regions_path {
        Some(path) => RegionTable::from_path(path),
        None => RegionTable::builtin(),
    }
    .map_err(|e| {
        tracing::error!("Failed to load solar region table: {}", e);
        AppError::ConfigError(anyhow::Error::new(e))
    })?;

    tracing::info!(regions = table.regions.len(), "Loaded solar region table");
    Ok(table)
}
