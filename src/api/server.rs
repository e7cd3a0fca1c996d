//! HTTP server startup and graceful shutdown.

use tokio::net::TcpListener;
use tracing::info;

use crate::api::routes::{build_router, ApiState};
use crate::config::ApiServerConfig;
use crate::errors::{Error, Result};

/// Bind the configured address and serve the API until interrupted.
pub async fn start_api_server(config: &ApiServerConfig, state: ApiState) -> Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| Error::Io {
        source: e,
        context: format!("Failed to bind API server to {}", addr),
    })?;

    info!(address = %addr, "API server listening");

    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Io { source: e, context: "API server terminated".to_string() })?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
}
