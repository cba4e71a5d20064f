//! Tolerant parsing of session transcripts.
//!
//! A transcript is one JSON record per line, written by the runtime and
//! possibly truncated or interleaved mid-line by concurrent writers. Lines
//! that fail to decode are skipped, never fatal: a corrupt transcript
//! degrades to partial state.
//!
//! Two scan directions exist on purpose. Session summaries scan forward and
//! exhaustively; checkpoints scan backward and stop collecting files after
//! the five most recent, because a checkpoint answers "what to resume", not
//! "what happened".

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::model::{OrchestrationPattern, RecentState, WorkflowState};

/// Namespace prefix marking a routed external-capability (MCP) call.
pub const MCP_PREFIX: &str = "mcp__";

/// Upper bound on the file list in a checkpoint scan.
pub const RECENT_FILE_LIMIT: usize = 5;

/// MCP server fragment -> expert bucket. Exact and non-overlapping; any
/// server not matched here is counted toward the total but left unbucketed.
const EXPERT_SERVERS: &[(&str, &str)] = &[
    ("hdf5", "data-expert"),
    ("adios", "data-expert"),
    ("parquet", "data-expert"),
    ("plot", "analysis-expert"),
    ("pandas", "analysis-expert"),
    ("darshan", "hpc-expert"),
    ("node_hardware", "hpc-expert"),
    ("arxiv", "research-expert"),
    ("context7", "research-expert"),
];

/// Safely truncate a string to a maximum character count (not bytes).
/// Prevents panics from slicing on multibyte UTF-8 character boundaries.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect::<String>() + "..."
    }
}

/// The narrow schema this subsystem actually reads from a transcript line.
/// Everything else in the record is ignored, not validated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TranscriptLine {
    subagent_type: Option<String>,
    tool_name: Option<String>,
    tool_input: Value,
}

impl TranscriptLine {
    fn expert(&self) -> Option<&str> {
        self.subagent_type.as_deref().filter(|s| !s.is_empty())
    }

    fn tool(&self) -> Option<&str> {
        self.tool_name.as_deref().filter(|s| !s.is_empty())
    }

    fn file_path(&self) -> Option<&str> {
        self.tool_input
            .get("file_path")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn decode_line(line: &str) -> Option<TranscriptLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// Server fragment of a namespaced tool name: `mcp__hdf5__convert` -> `hdf5`.
fn mcp_server(tool: &str) -> Option<&str> {
    tool.strip_prefix(MCP_PREFIX)?.split("__").next()
}

/// Expert bucket for an MCP server fragment, if the classification table
/// recognizes it.
pub fn classify_server(server: &str) -> Option<&'static str> {
    EXPERT_SERVERS
        .iter()
        .find(|(key, _)| server.contains(key))
        .map(|(_, expert)| *expert)
}

/// Forward, exhaustive scan: every decodable line contributes.
///
/// # Functional Core
/// Pure function - no I/O, just string parsing.
pub fn scan_full(content: &str) -> WorkflowState {
    let mut state = WorkflowState::default();

    for line in content.lines().filter_map(decode_line) {
        if let Some(expert) = line.expert() {
            state.experts_used.insert(expert.to_string());
        }

        if let Some(tool) = line.tool() {
            if let Some(server) = mcp_server(tool) {
                state.total_mcp_calls += 1;
                if let Some(expert) = classify_server(server) {
                    state
                        .mcps_by_expert
                        .entry(expert.to_string())
                        .or_default()
                        .insert(tool.to_string());
                }
            }
        }

        if let Some(path) = line.file_path() {
            state.files_processed.insert(path.to_string());
        }
    }

    state.orchestration_pattern = if state.experts_used.len() > 1 {
        OrchestrationPattern::MultiExpert
    } else {
        OrchestrationPattern::Single
    };
    state
}

/// Reverse, bounded scan for checkpoints: collects experts from the whole
/// transcript but only the `RECENT_FILE_LIMIT` most recently referenced
/// distinct files, most-recent first.
///
/// # Functional Core
/// Pure function - no I/O, just string parsing.
pub fn scan_recent(content: &str) -> RecentState {
    let mut state = RecentState::default();

    for line in content.lines().rev().filter_map(decode_line) {
        if let Some(expert) = line.expert() {
            state.experts_active.insert(expert.to_string());
        }

        if state.recent_files.len() < RECENT_FILE_LIMIT {
            if let Some(path) = line.file_path() {
                if !state.recent_files.iter().any(|p| p == path) {
                    state.recent_files.push(path.to_string());
                }
            }
        }
    }

    state
}

/// Expert identity and MCP usage extracted for the expert-result log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertInfo {
    pub expert: String,
    pub mcps_used: Vec<String>,
}

/// Scans a subagent's transcript for its expert type and the set of MCP
/// tools it invoked. The last `subagent_type` seen wins; an absent one
/// reports `"unknown"`.
pub fn extract_expert_info(content: &str) -> ExpertInfo {
    let mut expert = "unknown".to_string();
    let mut mcps = BTreeSet::new();

    for line in content.lines().filter_map(decode_line) {
        if let Some(name) = line.expert() {
            expert = name.to_string();
        }
        if let Some(tool) = line.tool() {
            if tool.starts_with(MCP_PREFIX) {
                mcps.insert(tool.to_string());
            }
        }
    }

    ExpertInfo {
        expert,
        mcps_used: mcps.into_iter().collect(),
    }
}
