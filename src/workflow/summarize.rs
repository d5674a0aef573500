//! Built-in iterative summarization flow.
//!
//! split → summarize → merge → check, with the length check looping back to
//! split on a `shorten` decision and terminating on `done`. The summarizer is
//! rule-based (first two sentences per chunk); all character counts are
//! Unicode scalar counts, not bytes.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::runtime::{EngineError, FlowState, GraphEngine, Node, NodeTask, TaskError, TaskOutput};

/// Catalog id of this flow.
pub const FLOW_ID: &str = "summarize";

/// Decision values emitted by [`CheckLength`].
pub mod decisions {
    pub const SHORTEN: &str = "shorten";
    pub const DONE: &str = "done";
}

/// State keys this flow reads and writes.
pub mod keys {
    pub const INPUT_TEXT: &str = "input_text";
    pub const CHUNKS: &str = "chunks";
    pub const SUMMARIES: &str = "summaries";
    pub const FINAL_SUMMARY: &str = "final_summary";
}

mod names {
    pub const SPLIT: &str = "split";
    pub const SUMMARIZE: &str = "summarize";
    pub const MERGE: &str = "merge";
    pub const CHECK: &str = "check";
}

/// Split `input_text` into fixed-size chunks.
pub struct SplitText {
    pub chunk_size: usize,
}

#[async_trait]
impl NodeTask for SplitText {
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError> {
        let text = state.get_str_or(keys::INPUT_TEXT, "").to_owned();
        let chunks = chunk_text(&text, self.chunk_size);
        tracing::debug!(
            "✂️ Split {} char(s) into {} chunk(s)",
            text.chars().count(),
            chunks.len()
        );
        Ok(TaskOutput::new().set(keys::CHUNKS, json!(chunks)))
    }
}

/// Summarize each chunk by keeping its first two sentences.
pub struct SummarizeChunks;

#[async_trait]
impl NodeTask for SummarizeChunks {
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError> {
        let chunks: Vec<String> = state.get_as(keys::CHUNKS).unwrap_or_default();
        let summaries: Vec<String> = chunks.iter().map(|chunk| summarize_chunk(chunk)).collect();
        tracing::debug!("📝 Summarized {} chunk(s)", summaries.len());
        Ok(TaskOutput::new().set(keys::SUMMARIES, json!(summaries)))
    }
}

/// Join all chunk summaries into one final summary.
pub struct MergeSummaries;

#[async_trait]
impl NodeTask for MergeSummaries {
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError> {
        let summaries: Vec<String> = state.get_as(keys::SUMMARIES).unwrap_or_default();
        let merged = summaries.join(" ");
        Ok(TaskOutput::new().set(keys::FINAL_SUMMARY, json!(merged)))
    }
}

/// Branching step: while the merged summary is over the limit, feed a
/// truncated copy back through the flow; otherwise finish.
pub struct CheckLength {
    pub limit: usize,
}

#[async_trait]
impl NodeTask for CheckLength {
    async fn run(&self, state: &mut FlowState) -> Result<TaskOutput, TaskError> {
        let summary = state.get_str_or(keys::FINAL_SUMMARY, "").to_owned();
        let length = summary.chars().count();

        if length > self.limit {
            let shortened: String = summary.chars().take(self.limit).collect();
            tracing::debug!(
                "📏 Summary at {} char(s) exceeds limit {} - shortening and looping",
                length,
                self.limit
            );
            return Ok(TaskOutput::new()
                .set(keys::INPUT_TEXT, json!(shortened))
                .decide(decisions::SHORTEN));
        }

        tracing::debug!("📏 Summary at {} char(s) within limit {}", length, self.limit);
        Ok(TaskOutput::new().decide(decisions::DONE))
    }
}

/// Build and validate the wired summarize engine.
pub fn build_summarize_flow(config: &EngineConfig) -> Result<GraphEngine, EngineError> {
    let mut split = Node::new(
        names::SPLIT,
        Arc::new(SplitText {
            chunk_size: config.chunk_size,
        }),
    );
    split.set_next(Some(names::SUMMARIZE.to_string()));

    let mut summarize = Node::new(names::SUMMARIZE, Arc::new(SummarizeChunks));
    summarize.set_next(Some(names::MERGE.to_string()));

    let mut merge = Node::new(names::MERGE, Arc::new(MergeSummaries));
    merge.set_next(Some(names::CHECK.to_string()));

    let mut check = Node::new(
        names::CHECK,
        Arc::new(CheckLength {
            limit: config.summary_limit,
        }),
    );
    check.set_conditional_next(HashMap::from([
        (decisions::SHORTEN.to_string(), Some(names::SPLIT.to_string())),
        (decisions::DONE.to_string(), None),
    ]));

    let mut engine = GraphEngine::new();
    engine.add_node(split)?;
    engine.add_node(summarize)?;
    engine.add_node(merge)?;
    engine.add_node(check)?;
    engine.validate()?;

    Ok(engine)
}

fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn summarize_chunk(chunk: &str) -> String {
    let sentences: Vec<&str> = chunk
        .split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect();
    sentences
        .iter()
        .take(2)
        .copied()
        .collect::<Vec<_>>()
        .join(". ")
}
