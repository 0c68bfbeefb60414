use crate::config::Config;
use crate::downloader::{Housekeeper, MediaService, ToolInfo};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error_response;
pub mod routes;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<MediaService>,
    /// Sweeper state, read by the status endpoint
    pub housekeeper: Housekeeper,
    /// Tool diagnostics captured at startup
    pub tool: Arc<ToolInfo>,
    pub config: Arc<Config>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let downloads = ServeDir::new(ctx.service.download_dir());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes())
        .nest_service("/downloads", downloads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server and the housekeeping sweeper
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let download_dir = config.storage.download_dir.clone();
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("Failed to create download directory: {:?}", download_dir))?;

    let tool = crate::check_tool(&config).await;
    let service = crate::build_service(&config);

    let housekeeper = Housekeeper::new(&download_dir, config.storage.max_age());
    let sweeper = housekeeper.clone().spawn(config.storage.sweep_interval());

    let ctx = AppContext {
        service: Arc::new(service),
        housekeeper,
        tool: Arc::new(tool),
        config: Arc::new(config),
    };

    let app = create_router(ctx);

    tracing::info!("Serving downloads from {:?}", download_dir);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    result?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
