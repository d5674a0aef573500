//! Node abstraction: a named task capability plus its transition rule.
//!
//! A node's identity is its name, unique within one engine registry. Routing
//! lives in a single tagged [`Transition`] per node, so an unconditional
//! successor and a decision table can never be configured at the same time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::runtime::error::TaskError;
use crate::runtime::state::{FlowState, TaskOutput};

/// The contract every unit of work fulfils.
///
/// A task reads the run state, may mutate it in place, and returns a
/// [`TaskOutput`] whose update map the engine merges afterwards. Branching
/// tasks populate [`TaskOutput::decision`]; omitting it at a decision node
/// means "fall through to termination".
#[async_trait]
pub trait NodeTask: Send + Sync {
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError>;
}

/// Adapter turning a plain closure into a [`NodeTask`].
pub struct FnTask<F>(pub F);

#[async_trait]
impl<F> NodeTask for FnTask<F>
where
    F: Fn(&mut FlowState) -> Result<TaskOutput, TaskError> + Send + Sync,
{
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError> {
        (self.0)(state)
    }
}

impl<F> FnTask<F>
where
    F: Fn(&mut FlowState) -> Result<TaskOutput, TaskError> + Send + Sync + 'static,
{
    /// Build a [`Node`] straight from a closure.
    pub fn node(name: impl Into<String>, task: F) -> Node {
        Node::new(name, Arc::new(FnTask(task)))
    }
}

/// A node's single transition rule.
///
/// Exactly one variant exists per node, making "the decision table wins" a
/// property of the type rather than a runtime precedence rule. `None`
/// successors mark termination.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Unconditional successor; `None` means the node is terminal.
    Next(Option<String>),
    /// Decision-keyed successor table. A missing decision, or a value absent
    /// from the table, resolves to termination rather than an error.
    Decide(HashMap<String, Option<String>>),
}

impl Transition {
    /// Resolve the successor for the given task decision.
    pub fn resolve(&self, decision: Option<&str>) -> Option<&str> {
        match self {
            Transition::Next(next) => next.as_deref(),
            Transition::Decide(table) => decision
                .and_then(|value| table.get(value))
                .and_then(|next| next.as_deref()),
        }
    }

    /// Every successor name this rule can reach, for wiring validation.
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Transition::Next(next) => next.as_deref().into_iter().collect(),
            Transition::Decide(table) => table.values().filter_map(|next| next.as_deref()).collect(),
        }
    }
}

/// A named step in the graph: task capability plus transition rule.
pub struct Node {
    name: String,
    task: Arc<dyn NodeTask>,
    transition: Transition,
}

impl Node {
    /// New node wrapping the given task. Starts terminal (`Next(None)`) until
    /// a transition is wired.
    pub fn new(name: impl Into<String>, task: Arc<dyn NodeTask>) -> Self {
        Self {
            name: name.into(),
            task,
            transition: Transition::Next(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task(&self) -> &Arc<dyn NodeTask> {
        &self.task
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// Wire the unconditional successor; `None` marks a potential terminal.
    pub fn set_next(&mut self, next: Option<String>) {
        self.transition = Transition::Next(next);
    }

    /// Wire the decision table; a `None` value marks that branch as terminal.
    pub fn set_conditional_next(&mut self, table: HashMap<String, Option<String>>) {
        self.transition = Transition::Decide(table);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("transition", &self.transition)
            .finish()
    }
}
