use axum::extract::DefaultBodyLimit;
use std::net::SocketAddr;
use std::sync::Arc;
use talent_board_backend::{
    config::Config,
    database::pool::create_pool,
    middleware::cors::api_cors,
    repository::{memory::MemoryStore, Storage},
    routes,
    services::{file_store::LocalFileStore, scheduler::CleanupScheduler},
    utils::time::SystemClock,
    AppState,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);

    let storage = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to PostgreSQL");
            Storage::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Storage::memory(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(config.uploads_dir.join("applications")).await?;
    let file_store = Arc::new(LocalFileStore::new(&config.uploads_dir));
    let app_state = AppState::new(config.clone(), storage, file_store, Arc::new(SystemClock));

    let scheduler = CleanupScheduler::start(app_state.cleanup_engine.clone(), &config.cleanup).await?;

    info!("Serving uploads from: {}", config.uploads_dir.display());

    let app = routes::router(app_state)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + 64 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await?;
        info!("Cleanup scheduler stopped");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
