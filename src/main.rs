//! Flowlite: hyperminimalist branching workflow engine
//!
//! Main entry point for the flowlite server. Initializes configuration and
//! starts the HTTP server with flow execution capabilities.

use flowlite::{config::Config, server::start_server};

/// Application entry point
///
/// Initializes the server with default configuration and starts listening for
/// requests. The server provides:
/// - Summarization endpoint at /api/summarize
/// - Generic flow execution at /api/runs/{flow_id}
/// - Catalog listing at /api/workflows
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3007)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
