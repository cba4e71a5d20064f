//! Session summaries, written once per session-stop event.
//!
//! Two artifacts land in the session directory: `session-summary.json`
//! (machine-readable) and `summary.md` (human-readable, first ten files
//! listed, remainder counted). The same directory also carries the
//! append-only `expert-results.jsonl` fed at subagent completion.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::HookConfig;
use crate::error::ArtifactError;
use crate::model::{ExpertResult, SessionSummary, WorkflowState};
use crate::transcript;

/// Machine-readable summary file name.
pub const SUMMARY_JSON: &str = "session-summary.json";
/// Human-readable report file name.
pub const SUMMARY_REPORT: &str = "summary.md";
/// Append-only expert completion log file name.
pub const EXPERT_RESULTS: &str = "expert-results.jsonl";

/// How many processed files the report lists explicitly before counting
/// the remainder.
pub const REPORT_FILE_LIMIT: usize = 10;

/// Wraps exhaustively scanned workflow state with attribution metadata.
pub fn build_summary(
    config: &HookConfig,
    state: WorkflowState,
    session_id: &str,
    now: DateTime<Utc>,
) -> SessionSummary {
    SessionSummary {
        state,
        session_id: session_id.to_string(),
        timestamp: now,
        warpio_version: config.version.clone(),
    }
}

/// Renders the human-readable report.
///
/// # Functional Core
/// Pure function - deterministic given the summary.
pub fn render_report(summary: &SessionSummary) -> String {
    let state = &summary.state;
    let experts: Vec<&str> = state.experts_used.iter().map(String::as_str).collect();
    let pattern = match state.orchestration_pattern {
        crate::model::OrchestrationPattern::Single => "single",
        crate::model::OrchestrationPattern::MultiExpert => "multi-expert",
    };

    let mut report = String::new();
    report.push_str("# Warpio Session Summary\n\n");
    report.push_str(&format!("**Session ID**: {}\n", summary.session_id));
    report.push_str(&format!("**Timestamp**: {}\n\n", summary.timestamp));
    report.push_str("## Orchestration\n");
    report.push_str(&format!("- Pattern: {pattern}\n"));
    report.push_str(&format!("- Experts Used: {}\n", experts.join(", ")));
    report.push_str(&format!("- Total MCP Calls: {}\n\n", state.total_mcp_calls));
    report.push_str("## Files Processed\n");
    for file in state.files_processed.iter().take(REPORT_FILE_LIMIT) {
        report.push_str(&format!("- {file}\n"));
    }
    if state.files_processed.len() > REPORT_FILE_LIMIT {
        report.push_str(&format!(
            "- ... and {} more\n",
            state.files_processed.len() - REPORT_FILE_LIMIT
        ));
    }
    report
}

/// Scans the transcript exhaustively and writes both summary artifacts into
/// the session directory. Returns the machine-readable summary path.
pub fn write_summary(
    config: &HookConfig,
    transcript_path: &str,
    session_id: &str,
) -> Result<PathBuf, ArtifactError> {
    let now = Utc::now();
    let content = fs::read_to_string(transcript_path).unwrap_or_default();
    let state = transcript::scan_full(&content);
    let summary = build_summary(config, state, session_id, now);

    let dir = config.session_dir(session_id, now);
    fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

    let json_path = dir.join(SUMMARY_JSON);
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(&json_path, json).map_err(|e| ArtifactError::io(&json_path, e))?;

    let report_path = dir.join(SUMMARY_REPORT);
    fs::write(&report_path, render_report(&summary))
        .map_err(|e| ArtifactError::io(&report_path, e))?;

    Ok(json_path)
}

/// Extracts expert identity and MCP usage from a subagent transcript and
/// appends one line to the session's expert-result log.
pub fn append_expert_result(
    config: &HookConfig,
    transcript_path: &str,
    session_id: &str,
) -> Result<PathBuf, ArtifactError> {
    let now = Utc::now();
    let content = fs::read_to_string(transcript_path).unwrap_or_default();
    let info = transcript::extract_expert_info(&content);

    let result = ExpertResult {
        timestamp: now,
        session_id: session_id.to_string(),
        expert: info.expert,
        mcp_count: info.mcps_used.len(),
        mcps_used: info.mcps_used,
    };

    let dir = config.session_dir(session_id, now);
    fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

    let path = dir.join(EXPERT_RESULTS);
    let mut line = serde_json::to_string(&result)?;
    line.push('\n');
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| f.write_all(line.as_bytes()))
        .map_err(|e| ArtifactError::io(&path, e))?;

    Ok(path)
}
