//! Animal Rescue MCP server.
//!
//! Exposes the adoption catalog as four MCP tools (`list_animals`, `get_animal_by_id`,
//! `get_animal_by_name`, `adopt_pet`) over stdio or streamable HTTP.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
mod render;
pub mod session_manager;
pub mod telemetry;

use crate::config::{Settings, TransportKind};
use crate::error::{Result, ServerError};
use crate::gateway::AnimalRescueServer;
use animal_rescue_adoption::{AdoptionService, CatalogStore};
use rmcp::ServiceExt as _;
use std::sync::Arc;

/// Load the catalog named by `settings` (or the built-in seed) and wrap it in a service.
///
/// # Errors
///
/// Returns an error if the catalog file cannot be loaded.
pub fn build_service(settings: &Settings) -> Result<Arc<AdoptionService>> {
    let store = match &settings.catalog {
        Some(path) => CatalogStore::load(path)?,
        None => CatalogStore::seeded()?,
    };
    tracing::info!(
        animals = store.len(),
        source = %settings
            .catalog
            .as_ref()
            .map_or_else(|| "built-in seed".to_string(), |p| p.display().to_string()),
        "catalog loaded"
    );

    let service =
        AdoptionService::new(Arc::new(store)).with_pickup_location(&settings.pickup_location);
    Ok(Arc::new(service))
}

/// Run the configured transport until the client disconnects or the process is signalled.
///
/// # Errors
///
/// Returns an error if the catalog fails to load or the transport fails.
pub async fn run(settings: Settings) -> Result<()> {
    let service = build_service(&settings)?;

    match settings.transport {
        TransportKind::Stdio => serve_stdio(service).await,
        TransportKind::Http => http::serve(service, settings.bind).await,
    }
}

async fn serve_stdio(service: Arc<AdoptionService>) -> Result<()> {
    tracing::info!("serving MCP over stdio");
    let running = AnimalRescueServer::new(service)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| ServerError::Transport(format!("stdio initialize: {e}")))?;

    let reason = running
        .waiting()
        .await
        .map_err(|e| ServerError::Transport(format!("stdio service task: {e}")))?;
    tracing::info!(?reason, "stdio transport stopped");
    Ok(())
}
