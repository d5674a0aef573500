//! Server setup and initialization.
//!
//! Wires together all components: catalog, built-in flows, and HTTP routes.
//! Provides the main application factory function for creating the Axum app.

use crate::{
    api::runs::{create_run_routes, AppState},
    config::Config,
    workflow::{catalog::FlowEntry, summarize, FlowCatalog},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Initializes the flow catalog, registers the built-in flows, and validates
/// each one's wiring up front so faults surface at startup, not on the first
/// request.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📊 Initializing flow catalog");
    let catalog = Arc::new(FlowCatalog::new());

    catalog.register(FlowEntry::new(
        summarize::FLOW_ID,
        "Iterative text summarization",
        Arc::new(summarize::build_summarize_flow),
    ))?;

    let flows = catalog.list();
    tracing::info!("🔍 Validating {} registered flow(s)", flows.len());
    for flow in &flows {
        if let Some(entry) = catalog.get(&flow.id) {
            entry
                .build(&config.engine)
                .map_err(|e| anyhow::anyhow!("flow '{}' failed validation: {}", flow.id, e))?;
        }
    }

    let app_state = AppState { catalog, config };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Run execution and catalog routes
        .merge(create_run_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting flowlite server...");

    // Create the application
    let app = create_app(config.clone()).await?;

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    // Start the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
