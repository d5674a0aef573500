//! Engine and task error types.

use thiserror::Error;

/// Errors produced by the graph engine (wiring + execution).
#[derive(Debug, Error)]
pub enum EngineError {
    /// `add_node` saw a name that is already registered. Overwriting is
    /// opt-in via `replace_node`.
    #[error("node '{0}' is already registered (use replace_node to overwrite)")]
    DuplicateNode(String),

    /// The run loop landed on a name with no node behind it.
    #[error("node '{0}' not found in the registry")]
    NodeNotFound(String),

    /// A transition references a node that was never registered.
    #[error("transition from '{from}' targets unknown node '{to}'")]
    UnknownSuccessor { from: String, to: String },

    /// A node's task failed. The run is aborted with no retry and no
    /// partial-state recovery.
    #[error("task for node '{node}' failed: {source}")]
    TaskFailed {
        node: String,
        #[source]
        source: TaskError,
    },
}

/// Error returned by a task capability.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TaskError(#[from] anyhow::Error);

impl TaskError {
    /// Build from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}
