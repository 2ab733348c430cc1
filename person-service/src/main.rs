mod config;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use shared::database::{close_connections, create_connection_pool};
use shared::observability::{init_logging, LogConfig};
use shared::store::PostgresStore;
use shared::DocumentStore;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{Config, SERVICE_NAME};
use crate::services::person_service::PersonService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(LogConfig::for_service(SERVICE_NAME, &config.logging))?;
    info!("Starting Person Service...");

    let db_pool = create_connection_pool(&config.database).await?;
    info!("Database connection pool established");

    let store = PostgresStore::open(db_pool.clone(), &config.bucket).await?;
    info!("Bucket '{}' opened", config.bucket);

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let person_service = Arc::new(PersonService::new(store.clone(), &config.bucket));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        person_service,
    });

    let app = app(app_state);

    let addr = config.server.address();
    info!("Person Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_connections(&db_pool).await;
    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/getAll", get(handlers::person::get_all))
        .route("/api/get", get(handlers::person::get))
        .route("/api/save", post(handlers::person::save))
        .route("/api/delete", post(handlers::person::delete))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub person_service: Arc<PersonService>,
}
