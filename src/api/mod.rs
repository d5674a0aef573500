//! HTTP API layer.
//!
//! This module provides the REST endpoints for running flows:
//! - Fixed summarize endpoint over one text payload
//! - Generic run endpoint for any catalogued flow
//! - Catalog listing

// Run execution endpoints
pub mod runs;

// Re-export router builder
pub use runs::create_run_routes;
