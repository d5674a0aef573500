//! Lock-free flow catalog using ArcSwap.
//!
//! Maps flow ids to builder functions. Serving contexts read the catalog
//! lock-free and build a fresh engine per request, so no run-scoped state
//! ever lives in a shared registry and in-flight runs never observe a
//! re-wired graph.

use anyhow::Result;
use arc_swap::ArcSwap;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

use crate::config::EngineConfig;
use crate::runtime::{EngineError, GraphEngine};

/// Builder producing a freshly wired engine for one run.
pub type FlowBuilder = Arc<dyn Fn(&EngineConfig) -> Result<GraphEngine, EngineError> + Send + Sync>;

/// A registered flow: identity plus its engine builder.
#[derive(Clone)]
pub struct FlowEntry {
    pub id: String,
    pub name: String,
    builder: FlowBuilder,
}

impl FlowEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, builder: FlowBuilder) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            builder,
        }
    }

    /// Build a fresh engine for one run.
    pub fn build(&self, config: &EngineConfig) -> Result<GraphEngine, EngineError> {
        (self.builder)(config)
    }
}

/// Listing row for the catalog API.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    pub id: String,
    pub name: String,
}

/// Atomic-swap registry of flow builders.
///
/// Reads are lock-free; registration clones the map and swaps the pointer,
/// the same pattern the rest of the crate uses for anything a request path
/// reads concurrently.
pub struct FlowCatalog {
    flows: ArcSwap<HashMap<String, FlowEntry>>,
}

impl FlowCatalog {
    pub fn new() -> Self {
        Self {
            flows: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// Register a flow. Duplicate ids are rejected.
    pub fn register(&self, entry: FlowEntry) -> Result<()> {
        let current = self.flows.load();
        if current.contains_key(&entry.id) {
            anyhow::bail!("flow '{}' is already registered", entry.id);
        }

        let mut next = (**current).clone();
        tracing::info!("📊 Registered flow '{}' ({})", entry.id, entry.name);
        next.insert(entry.id.clone(), entry);
        self.flows.store(Arc::new(next));

        Ok(())
    }

    /// Lock-free lookup. The clone is cheap: the builder is Arc-backed.
    pub fn get(&self, id: &str) -> Option<FlowEntry> {
        self.flows.load().get(id).cloned()
    }

    /// All registered flows, sorted by id.
    pub fn list(&self) -> Vec<FlowSummary> {
        let mut rows: Vec<FlowSummary> = self
            .flows
            .load()
            .values()
            .map(|entry| FlowSummary {
                id: entry.id.clone(),
                name: entry.name.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}

impl Default for FlowCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> FlowEntry {
        FlowEntry::new(id, format!("flow {id}"), Arc::new(|_config| Ok(GraphEngine::new())))
    }

    #[test]
    fn register_and_lookup() {
        let catalog = FlowCatalog::new();
        catalog.register(entry("a")).unwrap();
        catalog.register(entry("b")).unwrap();

        assert!(catalog.get("a").is_some());
        assert!(catalog.get("missing").is_none());

        let ids: Vec<String> = catalog.list().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let catalog = FlowCatalog::new();
        catalog.register(entry("a")).unwrap();
        assert!(catalog.register(entry("a")).is_err());
        assert_eq!(catalog.list().len(), 1);
    }
}
