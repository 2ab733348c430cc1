use anyhow::Result;
use medical_service::config::{Config, SERVICE_NAME};
use medical_service::services::medical_service::MedicalService;
use medical_service::{app, AppState};
use shared::database::{close_connections, create_connection_pool};
use shared::observability::{init_logging, LogConfig};
use shared::store::PostgresStore;
use shared::DocumentStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(LogConfig::for_service(SERVICE_NAME, &config.logging))?;
    info!("Starting Medical Service...");

    let db_pool = create_connection_pool(&config.database).await?;
    info!("Database connection pool established");

    let store = PostgresStore::open(db_pool.clone(), &config.bucket)
        .await?
        .with_search_index(config.search.index_definition());
    info!(
        "Bucket '{}' opened with search index '{}'",
        config.bucket, config.search.index
    );

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let medical_service = Arc::new(MedicalService::new(
        store.clone(),
        &config.bucket,
        config.search.clone(),
    ));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        medical_service,
    });

    let app = app(app_state);

    let addr = config.server.address();
    info!("Medical Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_connections(&db_pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
