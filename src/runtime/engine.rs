//! Graph execution engine.
//!
//! Owns the node registry and the start pointer, and drives the
//! run-to-completion loop: dispatch the current node's task, merge its output
//! into the run state, resolve the successor, repeat until a terminal
//! resolution or the step budget runs out. Graphs may contain cycles;
//! looping is a feature here, bounded at run time by the step budget.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::runtime::error::EngineError;
use crate::runtime::node::Node;
use crate::runtime::state::{FlowState, StateMap, TaskOutput};

/// Registry of named nodes plus the start pointer.
///
/// The start pointer is set exactly once, to the first node ever registered,
/// and never changes afterwards, not even when nodes are replaced. The engine
/// is stateless with respect to individual runs: all run-scoped data lives in
/// the [`FlowState`] each `run` call creates.
pub struct GraphEngine {
    nodes: HashMap<String, Node>,
    start: Option<String>,
}

/// Outcome of one run: the final state plus how the run ended.
#[derive(Debug)]
pub struct RunReport {
    /// Final run state, whether termination was natural or budget-triggered.
    pub state: FlowState,
    /// Number of node executions performed.
    pub steps: u32,
    /// True when the step budget stopped the run with a node still pending.
    pub truncated: bool,
}

impl GraphEngine {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            start: None,
        }
    }

    /// Register a node. The first node ever registered becomes the start node.
    ///
    /// Registering a name twice is an explicit error; use
    /// [`GraphEngine::replace_node`] when overwriting is intended.
    pub fn add_node(&mut self, node: Node) -> Result<(), EngineError> {
        if self.nodes.contains_key(node.name()) {
            return Err(EngineError::DuplicateNode(node.name().to_string()));
        }
        if self.start.is_none() {
            self.start = Some(node.name().to_string());
            tracing::debug!("🎯 Start node set to '{}'", node.name());
        }
        tracing::debug!("➕ Registered node '{}'", node.name());
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Overwrite (or insert) a node by name. The start pointer is untouched
    /// unless the registry was empty, in which case this node becomes first.
    pub fn replace_node(&mut self, node: Node) {
        if self.start.is_none() {
            self.start = Some(node.name().to_string());
        }
        tracing::debug!("♻️ Replaced node '{}'", node.name());
        self.nodes.insert(node.name().to_string(), node);
    }

    /// Name of the start node, if any node has been registered.
    pub fn start_node(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check the wiring: every transition target must name a registered node.
    ///
    /// Builds a directed graph of the registered transitions and walks it from
    /// the start node; nodes that can never be reached are logged. Cycles are
    /// legal and not checked; the step budget bounds them at run time.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();

        for name in self.nodes.keys() {
            let index = graph.add_node(name.as_str());
            index_of.insert(name.as_str(), index);
        }

        for (name, node) in &self.nodes {
            for successor in node.transition().successors() {
                let to = index_of
                    .get(successor)
                    .ok_or_else(|| EngineError::UnknownSuccessor {
                        from: name.clone(),
                        to: successor.to_string(),
                    })?;
                graph.add_edge(index_of[name.as_str()], *to, ());
            }
        }

        if let Some(start) = &self.start {
            let reachable = reachable_from(&graph, index_of[start.as_str()]);
            for (name, index) in &index_of {
                if !reachable.contains(index) {
                    tracing::warn!("⚠️ Node '{}' is unreachable from start '{}'", name, start);
                }
            }
        }

        tracing::debug!("✅ Wiring validated: {} node(s)", self.nodes.len());
        Ok(())
    }

    /// Execute the graph from the start node.
    ///
    /// Creates a fresh [`FlowState`] from `initial`, then loops: look up the
    /// current node (an unregistered name is a [`EngineError::NodeNotFound`]),
    /// await its task, merge the returned update, resolve the successor from
    /// the node's transition rule and the task's decision. `max_steps` is a
    /// hard bound against runaway loops; hitting it is reported via
    /// [`RunReport::truncated`] rather than silently returning.
    pub async fn run(&self, initial: StateMap, max_steps: u32) -> Result<RunReport, EngineError> {
        let run_id = uuid::Uuid::new_v4();
        let run_start = std::time::Instant::now();

        tracing::info!(
            "🚀 Run {} starting from {:?} ({} node(s), budget {} step(s))",
            run_id,
            self.start,
            self.nodes.len(),
            max_steps
        );
        tracing::debug!("📋 Run {} started at {}", run_id, chrono::Utc::now().to_rfc3339());

        let mut state = FlowState::new(initial);
        let mut current = self.start.clone();
        let mut steps: u32 = 0;

        while let Some(name) = current {
            if steps >= max_steps {
                tracing::warn!(
                    "⏸️ Run {} hit the step budget ({}) with node '{}' still pending - truncating",
                    run_id,
                    max_steps,
                    name
                );
                return Ok(RunReport {
                    state,
                    steps,
                    truncated: true,
                });
            }

            let node = self
                .nodes
                .get(&name)
                .ok_or_else(|| EngineError::NodeNotFound(name.clone()))?;

            tracing::info!("📍 Run {} step {}: executing node '{}'", run_id, steps + 1, name);
            let step_start = std::time::Instant::now();

            let output = node
                .task()
                .run(&mut state)
                .await
                .map_err(|source| EngineError::TaskFailed {
                    node: name.clone(),
                    source,
                })?;

            let TaskOutput { update, decision } = output;
            tracing::debug!(
                "📤 Node '{}' produced {} update key(s), decision {:?}",
                name,
                update.len(),
                decision
            );

            state.update(update);
            let next = node
                .transition()
                .resolve(decision.as_deref())
                .map(str::to_owned);

            tracing::info!("✅ Node '{}' completed in {:?}", name, step_start.elapsed());

            current = next;
            steps += 1;
        }

        tracing::info!(
            "🎉 Run {} completed in {} step(s), {:?}",
            run_id,
            steps,
            run_start.elapsed()
        );

        Ok(RunReport {
            state,
            steps,
            truncated: false,
        })
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// All nodes reachable from `start` by following transition edges (BFS).
fn reachable_from(graph: &DiGraph<&str, ()>, start: NodeIndex) -> HashSet<NodeIndex> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();

    queue.push_back(start);
    reachable.insert(start);

    while let Some(current) = queue.pop_front() {
        for target in graph.neighbors(current) {
            if reachable.insert(target) {
                queue.push_back(target);
            }
        }
    }

    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::node::FnTask;
    use serde_json::json;
    use std::collections::HashMap;

    /// Task that increments a counter key in state.
    fn counting_node(name: &str) -> Node {
        FnTask::node(name, |state| {
            let count = state.get_as::<u64>("count").unwrap_or(0);
            Ok(TaskOutput::new().set("count", json!(count + 1)))
        })
    }

    fn noop_node(name: &str) -> Node {
        FnTask::node(name, |_state| Ok(TaskOutput::new()))
    }

    #[tokio::test]
    async fn start_is_the_first_node_ever_added() {
        let mut engine = GraphEngine::new();
        engine.add_node(noop_node("first")).unwrap();
        engine.add_node(noop_node("second")).unwrap();
        assert_eq!(engine.start_node(), Some("first"));

        // Replacing either node leaves the start pointer alone.
        engine.replace_node(noop_node("first"));
        engine.replace_node(noop_node("second"));
        assert_eq!(engine.start_node(), Some("first"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let mut engine = GraphEngine::new();
        engine.add_node(noop_node("a")).unwrap();

        let err = engine.add_node(noop_node("a")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode(name) if name == "a"));
        assert_eq!(engine.node_count(), 1);
    }

    #[tokio::test]
    async fn terminal_node_runs_exactly_one_step() {
        let mut engine = GraphEngine::new();
        engine.add_node(counting_node("only")).unwrap();

        let report = engine.run(StateMap::new(), 20).await.unwrap();
        assert_eq!(report.steps, 1);
        assert!(!report.truncated);
        assert_eq!(report.state.get_as::<u64>("count"), Some(1));
    }

    #[tokio::test]
    async fn self_loop_is_truncated_at_the_step_budget() {
        let mut engine = GraphEngine::new();
        let mut looper = counting_node("loop");
        looper.set_next(Some("loop".to_string()));
        engine.add_node(looper).unwrap();

        let report = engine.run(StateMap::new(), 5).await.unwrap();
        assert_eq!(report.steps, 5);
        assert!(report.truncated);
        // The task ran exactly max_steps times.
        assert_eq!(report.state.get_as::<u64>("count"), Some(5));
    }

    #[tokio::test]
    async fn decision_table_routes_and_terminates() {
        // The router reads the decision to emit from the initial state, so one
        // wiring covers all the outcomes.
        let build = || {
            let mut engine = GraphEngine::new();
            let mut router = FnTask::node("router", |state| {
                let mut output = TaskOutput::new();
                if let Some(value) = state.get("emit").and_then(|v| v.as_str()) {
                    output = output.decide(value.to_string());
                }
                Ok(output)
            });
            router.set_conditional_next(HashMap::from([
                ("shorten".to_string(), Some("a".to_string())),
                ("done".to_string(), None),
            ]));
            engine.add_node(router).unwrap();
            engine.add_node(counting_node("a")).unwrap();
            engine
        };

        let mut initial = StateMap::new();
        initial.insert("emit".to_string(), json!("shorten"));
        let report = build().run(initial, 20).await.unwrap();
        // Router ran, then the run resumed at node "a".
        assert_eq!(report.steps, 2);
        assert_eq!(report.state.get_as::<u64>("count"), Some(1));

        let mut initial = StateMap::new();
        initial.insert("emit".to_string(), json!("done"));
        let report = build().run(initial, 20).await.unwrap();
        assert_eq!(report.steps, 1);
        assert!(!report.truncated);

        // No decision emitted, and an unmatched value, both terminate cleanly.
        let report = build().run(StateMap::new(), 20).await.unwrap();
        assert_eq!(report.steps, 1);

        let mut initial = StateMap::new();
        initial.insert("emit".to_string(), json!("mystery"));
        let report = build().run(initial, 20).await.unwrap();
        assert_eq!(report.steps, 1);
        assert!(!report.truncated);
    }

    #[tokio::test]
    async fn dangling_successor_fails_with_node_not_found() {
        let mut engine = GraphEngine::new();
        let mut node = noop_node("a");
        node.set_next(Some("ghost".to_string()));
        engine.add_node(node).unwrap();

        let err = engine.run(StateMap::new(), 20).await.unwrap_err();
        assert!(matches!(err, EngineError::NodeNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn validate_catches_dangling_wiring_statically() {
        let mut engine = GraphEngine::new();
        let mut node = noop_node("a");
        node.set_next(Some("ghost".to_string()));
        engine.add_node(node).unwrap();

        let err = engine.validate().unwrap_err();
        assert!(
            matches!(err, EngineError::UnknownSuccessor { ref from, ref to } if from == "a" && to == "ghost")
        );
    }

    #[tokio::test]
    async fn empty_engine_runs_zero_steps() {
        let engine = GraphEngine::new();
        let mut initial = StateMap::new();
        initial.insert("seed".to_string(), json!(1));

        let report = engine.run(initial, 20).await.unwrap();
        assert_eq!(report.steps, 0);
        assert!(!report.truncated);
        assert_eq!(report.state.get("seed"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn failing_task_aborts_the_run() {
        let mut engine = GraphEngine::new();
        engine
            .add_node(FnTask::node("boom", |_state| {
                Err(crate::runtime::TaskError::msg("exploded"))
            }))
            .unwrap();

        let err = engine.run(StateMap::new(), 20).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskFailed { ref node, .. } if node == "boom"));
    }
}
