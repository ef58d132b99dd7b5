//! Serve command - Starts the HTTP server and the notification worker.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::{
    Config, NOTIFICATION_DRAIN_TIMEOUT_SECONDS, NOTIFICATION_WORKER_CONCURRENCY,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, LogNotifier, Notifier, NovuClient, OtpStore, RateLimiter};
use crate::jobs;
use crate::services::Services;

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    let db = Arc::new(Database::connect(&config).await?);
    tracing::info!("Database connected");

    let cache = Arc::new(Cache::connect(&config).await?);
    tracing::info!("Redis cache connected");

    let notifier: Arc<dyn Notifier> = match config.novu.clone() {
        Some(novu) => {
            tracing::info!(api_url = %novu.api_url, "Delivering OTPs through Novu");
            Arc::new(NovuClient::new(novu)?)
        }
        None => {
            tracing::warn!("NOVU_API_KEY not set, OTPs will only be logged");
            Arc::new(LogNotifier)
        }
    };
    let (queue, worker) = jobs::start(
        notifier,
        config.notification_queue_capacity,
        NOTIFICATION_WORKER_CONCURRENCY,
    );

    let addr = config.server_addr();
    let trust_proxy_headers = config.trust_proxy_headers;
    let otp_store: Arc<dyn OtpStore> = cache.clone();
    let services = Services::from_parts(db.get_connection(), otp_store, queue, config);
    let rate_limiter: Arc<dyn RateLimiter> = cache.clone();
    let app_state = AppState::from_container(&services, rate_limiter, db, cache)
        .with_trusted_proxy(trust_proxy_headers);
    // The container's queue handles must go so the worker can drain
    drop(services);

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped, draining notification queue");
    worker
        .shutdown(Duration::from_secs(NOTIFICATION_DRAIN_TIMEOUT_SECONDS))
        .await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
