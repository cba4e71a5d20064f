//! Per-lifecycle-point entry points.
//!
//! Each handler reads one envelope, performs its best-effort observation,
//! and always returns an approval: this subsystem observes the workflow, it
//! never blocks it. Failures surface only as a diagnostic in the response
//! reason (and a stderr warning), never as an error to the runtime.

use std::io::Read;

use chrono::Utc;

use crate::checkpoint;
use crate::config::HookConfig;
use crate::error::StoreError;
use crate::model::{payload_text, HookEnvelope, HookResponse};
use crate::store::{LogDir, LogKind, MetricRecord, ResultRecord, TaskRecord};
use crate::summary;
use crate::transcript::truncate_str;

/// Character budget for a diagnostic carried in a response reason.
const DIAGNOSTIC_LIMIT: usize = 100;
/// Character budget for a tool-input preview in the task log.
const INPUT_PREVIEW_LIMIT: usize = 200;
/// Character budget for a subagent result preview in the aggregation log.
const RESULT_PREVIEW_LIMIT: usize = 500;

/// Tools whose output is worth a performance metric. Matched
/// case-insensitively as substrings of the observed tool name.
const TRACKED_TOOLS: &[&str] = &["mcp__hdf5", "mcp__numpy", "mcp__pandas", "bash"];

fn is_tracked_tool(tool_name: &str) -> bool {
    let lower = tool_name.to_lowercase();
    TRACKED_TOOLS.iter().any(|t| lower.contains(t))
}

fn decode_or_default(input: &mut impl Read) -> Result<HookEnvelope, HookResponse> {
    HookEnvelope::read_from(input)
        .map_err(|_| HookResponse::approve("Invalid input format, proceeding normally"))
}

fn degraded(err: impl std::fmt::Display) -> HookResponse {
    HookResponse::approve(format!(
        "Hook error (continuing): {}",
        truncate_str(&err.to_string(), DIAGNOSTIC_LIMIT)
    ))
}

/// Pre-tool-use: append a task record to the daily workflow log.
pub fn pre_tool_use(config: &HookConfig, input: &mut impl Read) -> HookResponse {
    let envelope = match decode_or_default(input) {
        Ok(e) => e,
        Err(response) => return response,
    };

    if let Err(err) = log_task(config, &envelope) {
        eprintln!("Warning: task logging failed: {err}");
    }
    HookResponse::approve("Task logged for orchestration tracking")
}

fn log_task(config: &HookConfig, envelope: &HookEnvelope) -> Result<(), StoreError> {
    let record = TaskRecord {
        timestamp: Utc::now(),
        tool: envelope.tool_name.clone(),
        input_preview: truncate_str(&payload_text(&envelope.tool_input), INPUT_PREVIEW_LIMIT),
        session_id: config.session_label(&envelope.session_id),
    };
    LogDir::resolve(config)?.append(LogKind::Tasks, &record)?;
    Ok(())
}

/// Post-tool-use: append a performance metric for tracked tools.
pub fn post_tool_use(config: &HookConfig, input: &mut impl Read) -> HookResponse {
    let envelope = match decode_or_default(input) {
        Ok(e) => e,
        Err(response) => return response,
    };

    if is_tracked_tool(&envelope.tool_name) {
        if let Err(err) = log_metric(config, &envelope) {
            eprintln!("Warning: metric logging failed: {err}");
        }
    }
    HookResponse::approve("Performance metrics tracked")
}

fn log_metric(config: &HookConfig, envelope: &HookEnvelope) -> Result<(), StoreError> {
    let record = MetricRecord {
        timestamp: Utc::now(),
        tool: envelope.tool_name.clone(),
        output_size: payload_text(&envelope.tool_output).chars().count(),
    };
    LogDir::resolve(config)?.append(LogKind::Metrics, &record)?;
    Ok(())
}

/// Subagent stop: aggregate the result for workflow analysis and, when
/// logging is enabled and a transcript is available, record the expert's
/// MCP usage in the session directory.
pub fn subagent_stop(config: &HookConfig, input: &mut impl Read) -> HookResponse {
    let envelope = match decode_or_default(input) {
        Ok(e) => e,
        Err(response) => return response,
    };

    if let Err(err) = log_result(config, &envelope) {
        eprintln!("Warning: result aggregation failed: {err}");
    }

    if config.logging_enabled && !envelope.transcript_path.is_empty() {
        let session = config.session_label(&envelope.session_id);
        if let Err(err) =
            summary::append_expert_result(config, &envelope.transcript_path, &session)
        {
            eprintln!("Warning: expert result logging failed: {err}");
        }
    }

    let response = HookResponse::approve("Subagent results aggregated");
    if envelope.subagent_name.is_empty() {
        response
    } else {
        response.with_output(
            "SubagentStop",
            format!(
                "Results from {} captured for orchestration analysis",
                envelope.subagent_name
            ),
        )
    }
}

fn log_result(config: &HookConfig, envelope: &HookEnvelope) -> Result<(), StoreError> {
    let record = ResultRecord {
        timestamp: Utc::now(),
        subagent: envelope.subagent_name.clone(),
        result_preview: truncate_str(&payload_text(&envelope.result), RESULT_PREVIEW_LIMIT),
    };
    LogDir::resolve(config)?.append(LogKind::SubagentResults, &record)?;
    Ok(())
}

/// Pre-compact: write a resumable checkpoint. Gated on the logging flag;
/// disabled means no side effects at all.
pub fn pre_compact(config: &HookConfig, input: &mut impl Read) -> HookResponse {
    if !config.logging_enabled {
        return HookResponse::approve("Workflow logging disabled");
    }

    let envelope = match decode_or_default(input) {
        Ok(e) => e,
        Err(response) => return response,
    };

    let session = config.session_label(&envelope.session_id);
    match checkpoint::write_checkpoint(
        config,
        &envelope.transcript_path,
        envelope.trigger,
        &session,
    ) {
        Ok(path) => HookResponse::approve(format!(
            "Checkpoint created: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        )),
        Err(err) => degraded(err),
    }
}

/// Session stop: write the session summary. Same gate as checkpointing.
pub fn stop(config: &HookConfig, input: &mut impl Read) -> HookResponse {
    if !config.logging_enabled {
        return HookResponse::approve("Workflow logging disabled");
    }

    let envelope = match decode_or_default(input) {
        Ok(e) => e,
        Err(response) => return response,
    };

    let session = config.session_label(&envelope.session_id);
    match summary::write_summary(config, &envelope.transcript_path, &session) {
        Ok(_) => HookResponse::approve("Session summary recorded"),
        Err(err) => degraded(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decision;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(root: &Path, logging_enabled: bool) -> HookConfig {
        HookConfig {
            workflow_dir: Some(root.join("workflows")),
            log_root: root.join("logs"),
            logging_enabled,
            session_id: None,
            version: "1.0.0".to_string(),
            home_dir: None,
            working_dir: root.to_path_buf(),
        }
    }

    #[test]
    fn tracked_tool_matching_is_case_insensitive() {
        assert!(is_tracked_tool("Bash"));
        assert!(is_tracked_tool("mcp__HDF5__convert"));
        assert!(is_tracked_tool("mcp__pandas__describe"));
        assert!(!is_tracked_tool("Read"));
        assert!(!is_tracked_tool("mcp__arxiv__search"));
    }

    #[test]
    fn pre_tool_use_approves_and_logs() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new(
            r#"{"session_id":"s-1","tool_name":"Bash","tool_input":{"command":"ls"}}"#,
        );

        let response = pre_tool_use(&config, &mut input);
        assert_eq!(response.decision, Decision::Approve);

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("workflows"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(entries.iter().any(|n| n.starts_with("tasks_")));
    }

    #[test]
    fn pre_tool_use_malformed_input_still_approves() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new("definitely not json");

        let response = pre_tool_use(&config, &mut input);
        assert_eq!(response.decision, Decision::Approve);
        assert_eq!(response.reason, "Invalid input format, proceeding normally");
    }

    #[test]
    fn post_tool_use_skips_untracked_tools() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new(r#"{"tool_name":"Read","tool_output":"contents"}"#);

        let response = post_tool_use(&config, &mut input);
        assert_eq!(response.decision, Decision::Approve);
        // Untracked tool: the log directory is never even resolved.
        assert!(!tmp.path().join("workflows").exists());
    }

    #[test]
    fn subagent_stop_names_the_subagent_in_output() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input =
            Cursor::new(r#"{"subagent_name":"data-expert","result":"converted 3 files"}"#);

        let response = subagent_stop(&config, &mut input);
        let output = response.hook_specific_output.unwrap();
        assert_eq!(output.hook_event_name, "SubagentStop");
        assert!(output.additional_context.contains("data-expert"));
    }

    #[test]
    fn subagent_stop_anonymous_subagent_has_no_output() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new(r#"{"result":"done"}"#);

        let response = subagent_stop(&config, &mut input);
        assert!(response.hook_specific_output.is_none());
    }

    #[test]
    fn pre_compact_disabled_has_zero_side_effects() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new(r#"{"transcript_path":"/tmp/t.jsonl"}"#);

        let response = pre_compact(&config, &mut input);
        assert_eq!(response.decision, Decision::Approve);
        assert!(!tmp.path().join("logs").exists());
        assert!(!tmp.path().join("workflows").exists());
    }

    #[test]
    fn stop_disabled_has_zero_side_effects() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), false);
        let mut input = Cursor::new(r#"{"transcript_path":"/tmp/t.jsonl"}"#);

        let response = stop(&config, &mut input);
        assert_eq!(response.decision, Decision::Approve);
        assert!(!tmp.path().join("logs").exists());
    }

    #[test]
    fn pre_compact_enabled_writes_checkpoint() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), true);
        let transcript = tmp.path().join("t.jsonl");
        std::fs::write(
            &transcript,
            r#"{"tool_name":"mcp__hdf5__convert","tool_input":{"file_path":"a.nc"}}"#,
        )
        .unwrap();

        let payload = format!(
            r#"{{"session_id":"s-1","transcript_path":{},"trigger":"auto"}}"#,
            serde_json::to_string(transcript.to_str().unwrap()).unwrap()
        );
        let mut input = Cursor::new(payload);

        let response = pre_compact(&config, &mut input);
        assert!(response.reason.starts_with("Checkpoint created: checkpoint-"));
        assert!(tmp
            .path()
            .join("logs")
            .join("session-s-1")
            .join(checkpoint::LATEST_POINTER)
            .exists());
    }

    #[test]
    fn stop_enabled_writes_summary_artifacts() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), true);
        let transcript = tmp.path().join("t.jsonl");
        std::fs::write(&transcript, r#"{"subagent_type":"data-expert"}"#).unwrap();

        let payload = format!(
            r#"{{"session_id":"s-2","transcript_path":{}}}"#,
            serde_json::to_string(transcript.to_str().unwrap()).unwrap()
        );
        let mut input = Cursor::new(payload);

        let response = stop(&config, &mut input);
        assert_eq!(response.reason, "Session summary recorded");
        let session_dir = tmp.path().join("logs").join("session-s-2");
        assert!(session_dir.join(summary::SUMMARY_JSON).exists());
        assert!(session_dir.join(summary::SUMMARY_REPORT).exists());
    }
}
