//! Flowlite: hyperminimalist branching workflow engine
//!
//! This library provides a directed-graph execution core over shared
//! key/value state, a lock-free flow catalog, and the HTTP surface that
//! runs catalogued flows.

// Core configuration and setup
pub mod config;

// Runtime execution engine - state container, nodes, and the run loop
pub mod runtime;

// Workflow layer - built-in flow definitions and the flow catalog
pub mod workflow;

// HTTP API layer - REST endpoints for running flows
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{
    EngineError, FlowState, FnTask, GraphEngine, Node, NodeTask, RunReport, StateMap, TaskError,
    TaskOutput, Transition,
};
pub use server::start_server;
pub use workflow::{FlowCatalog, FlowEntry};
