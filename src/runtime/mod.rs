//! Runtime execution engine.
//!
//! This module provides the directed-graph execution core:
//! - Shared key/value run state with right-biased merge
//! - Named nodes pairing a task capability with a transition rule
//! - The run loop: dispatch, merge, branch, step budget
//! - Wiring validation over a petgraph view of the transitions

// Core execution engine and run loop
pub mod engine;

// Engine and task error taxonomy
pub mod error;

// Node, transition rule, and the task contract
pub mod node;

// Run state container and task output
pub mod state;

// Re-export main types
pub use engine::{GraphEngine, RunReport};
pub use error::{EngineError, TaskError};
pub use node::{FnTask, Node, NodeTask, Transition};
pub use state::{FlowState, StateMap, TaskOutput};
