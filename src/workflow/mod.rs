//! Workflow layer.
//!
//! This module holds the built-in flow definitions and the lock-free catalog
//! the serving layer builds engines from:
//! - Flow catalog (ArcSwap registry of flow builders)
//! - Iterative summarization flow (split → summarize → merge → check)

// Lock-free catalog of flow builders
pub mod catalog;

// Built-in iterative summarization flow
pub mod summarize;

// Re-export commonly used types
pub use catalog::{FlowBuilder, FlowCatalog, FlowEntry, FlowSummary};
pub use summarize::build_summarize_flow;
