//! Streamable HTTP transport: `/mcp` plus health and status endpoints.

use crate::error::{Result, ServerError};
use crate::gateway::AnimalRescueServer;
use crate::session_manager::AnimalRescueSessionManager;
use animal_rescue_adoption::{AdoptionService, CatalogCounts};
use axum::{Json, Router, extract::State, routing::get};
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    service: Arc<AdoptionService>,
    sessions: Arc<AnimalRescueSessionManager>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    catalog: CatalogCounts,
    open_sessions: usize,
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        catalog: state.service.store().counts(),
        open_sessions: state.sessions.open_sessions(),
    })
}

/// Build the HTTP router. Every MCP session shares the same adoption service.
pub fn router(service: Arc<AdoptionService>) -> Router {
    let sessions = Arc::new(AnimalRescueSessionManager::new());

    let mcp_service = {
        let service = Arc::clone(&service);
        StreamableHttpService::new(
            move || Ok(AnimalRescueServer::new(Arc::clone(&service))),
            Arc::clone(&sessions),
            StreamableHttpServerConfig::default(),
        )
    };

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .nest_service("/mcp", mcp_service)
        .with_state(AppState { service, sessions })
}

/// Serve the HTTP transport until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(service: Arc<AdoptionService>, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| ServerError::Transport(format!("bind {bind}: {e}")))?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "listening (streamable HTTP on /mcp)");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP transport stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
