//! Resumable workflow checkpoints, written before context compaction.
//!
//! A checkpoint is immutable once written; only the `latest-checkpoint.json`
//! pointer beside it is replaced. The remove-then-symlink replacement is not
//! atomic across the two steps, which is accepted: a resuming caller treats
//! a missing pointer as "pick the newest checkpoint file in the directory".

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::HookConfig;
use crate::error::ArtifactError;
use crate::model::{Checkpoint, CompactTrigger, Environment, RecentState};
use crate::transcript;

/// Name of the pointer to the most recent checkpoint in a session directory.
pub const LATEST_POINTER: &str = "latest-checkpoint.json";

/// Assembles a checkpoint from recency-biased transcript state and
/// environment metadata.
///
/// # Functional Core
/// Pure function - no I/O; the transcript content is read by the caller.
pub fn build_checkpoint(
    config: &HookConfig,
    transcript_path: &str,
    trigger: CompactTrigger,
    session_id: &str,
    state: RecentState,
    now: DateTime<Utc>,
) -> Checkpoint {
    let mut resume_instructions = Vec::new();
    if !state.experts_active.is_empty() {
        let experts: Vec<&str> = state.experts_active.iter().map(String::as_str).collect();
        resume_instructions.push(format!("Resume with experts: {}", experts.join(", ")));
    }
    if let Some(most_recent) = state.recent_files.first() {
        resume_instructions.push(format!("Continue processing: {most_recent}"));
    }

    Checkpoint {
        timestamp: now,
        trigger,
        transcript: transcript_path.to_string(),
        environment: Environment {
            warpio_version: config.version.clone(),
            working_dir: config.working_dir.display().to_string(),
        },
        state,
        resume_instructions,
        session_id: session_id.to_string(),
    }
}

/// Scans the transcript and writes a checkpoint into the session directory,
/// then repoints `latest-checkpoint.json` at it. Returns the checkpoint path.
///
/// A missing or unreadable transcript degrades to an empty state; only the
/// artifact write itself can fail.
pub fn write_checkpoint(
    config: &HookConfig,
    transcript_path: &str,
    trigger: CompactTrigger,
    session_id: &str,
) -> Result<PathBuf, ArtifactError> {
    let now = Utc::now();
    let content = fs::read_to_string(transcript_path).unwrap_or_default();
    let state = transcript::scan_recent(&content);
    let checkpoint = build_checkpoint(config, transcript_path, trigger, session_id, state, now);

    let dir = config.session_dir(session_id, now);
    fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

    let name = format!("checkpoint-{}.json", now.format("%H%M%S"));
    let path = dir.join(&name);
    let json = serde_json::to_string_pretty(&checkpoint)?;
    fs::write(&path, json).map_err(|e| ArtifactError::io(&path, e))?;

    replace_latest_pointer(&dir, &name)?;
    Ok(path)
}

/// Repoints the latest-pointer at `target_name` within `dir`,
/// remove-then-recreate.
fn replace_latest_pointer(dir: &Path, target_name: &str) -> Result<(), ArtifactError> {
    let pointer = dir.join(LATEST_POINTER);
    match fs::remove_file(&pointer) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ArtifactError::io(&pointer, e)),
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target_name, &pointer)
        .map_err(|e| ArtifactError::io(&pointer, e))?;

    #[cfg(not(unix))]
    fs::copy(dir.join(target_name), &pointer)
        .map(|_| ())
        .map_err(|e| ArtifactError::io(&pointer, e))?;

    Ok(())
}

/// Resolves the most recent checkpoint in a session directory.
///
/// Follows the latest-pointer when present; otherwise lists the directory
/// and picks the newest `checkpoint-*.json` by name, covering the window
/// where a crash removed the pointer without recreating it.
pub fn find_latest_checkpoint(dir: &Path) -> Option<PathBuf> {
    let pointer = dir.join(LATEST_POINTER);
    // exists() follows the symlink, so a dangling pointer falls through.
    if pointer.exists() {
        return Some(pointer);
    }

    let mut newest: Option<String> = None;
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("checkpoint-") && name.ends_with(".json") {
            if newest.as_deref().map_or(true, |n| name.as_str() > n) {
                newest = Some(name);
            }
        }
    }
    newest.map(|name| dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_config(log_root: &Path) -> HookConfig {
        HookConfig {
            workflow_dir: None,
            log_root: log_root.to_path_buf(),
            logging_enabled: true,
            session_id: None,
            version: "1.0.0".to_string(),
            home_dir: None,
            working_dir: PathBuf::from("/work"),
        }
    }

    #[test]
    fn build_checkpoint_derives_resume_instructions() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let state = RecentState {
            experts_active: BTreeSet::from(["data-expert".to_string()]),
            recent_files: vec!["b.h5".to_string(), "a.nc".to_string()],
        };

        let checkpoint = build_checkpoint(
            &config,
            "/tmp/t.jsonl",
            CompactTrigger::Auto,
            "s-1",
            state,
            Utc::now(),
        );

        assert_eq!(
            checkpoint.resume_instructions,
            vec![
                "Resume with experts: data-expert",
                "Continue processing: b.h5"
            ]
        );
        assert_eq!(checkpoint.environment.warpio_version, "1.0.0");
        assert_eq!(checkpoint.trigger, CompactTrigger::Auto);
    }

    #[test]
    fn build_checkpoint_empty_state_has_no_instructions() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let checkpoint = build_checkpoint(
            &config,
            "/tmp/t.jsonl",
            CompactTrigger::Manual,
            "",
            RecentState::default(),
            Utc::now(),
        );
        assert!(checkpoint.resume_instructions.is_empty());
    }

    #[test]
    fn write_checkpoint_persists_artifact_and_latest_pointer() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let transcript = tmp.path().join("transcript.jsonl");
        fs::write(
            &transcript,
            r#"{"subagent_type":"data-expert"}
{"tool_name":"mcp__hdf5__convert","tool_input":{"file_path":"a.nc"}}"#,
        )
        .unwrap();

        let path = write_checkpoint(
            &config,
            transcript.to_str().unwrap(),
            CompactTrigger::Manual,
            "s-1",
        )
        .unwrap();

        assert!(path.starts_with(tmp.path().join("session-s-1")));
        let checkpoint: Checkpoint =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(checkpoint.state.experts_active.contains("data-expert"));
        assert_eq!(checkpoint.state.recent_files, vec!["a.nc"]);
        assert_eq!(checkpoint.session_id, "s-1");

        let latest = path.parent().unwrap().join(LATEST_POINTER);
        let via_pointer: Checkpoint =
            serde_json::from_str(&fs::read_to_string(&latest).unwrap()).unwrap();
        assert_eq!(via_pointer, checkpoint);
    }

    #[test]
    fn write_checkpoint_tolerates_missing_transcript() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());

        let path = write_checkpoint(
            &config,
            "/nonexistent/transcript.jsonl",
            CompactTrigger::Auto,
            "s-2",
        )
        .unwrap();

        let checkpoint: Checkpoint =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(checkpoint.state.experts_active.is_empty());
        assert!(checkpoint.state.recent_files.is_empty());
    }

    #[test]
    fn find_latest_checkpoint_prefers_pointer() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let path = write_checkpoint(&config, "/nonexistent", CompactTrigger::Manual, "s-3")
            .unwrap();

        let found = find_latest_checkpoint(path.parent().unwrap()).unwrap();
        assert_eq!(found.file_name().unwrap().to_str().unwrap(), LATEST_POINTER);
    }

    #[test]
    fn find_latest_checkpoint_falls_back_when_pointer_missing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("session-x");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("checkpoint-100000.json"), "{}").unwrap();
        fs::write(dir.join("checkpoint-143000.json"), "{}").unwrap();
        fs::write(dir.join("summary.md"), "# not a checkpoint").unwrap();

        let found = find_latest_checkpoint(&dir).unwrap();
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "checkpoint-143000.json"
        );
    }

    #[test]
    fn find_latest_checkpoint_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(find_latest_checkpoint(tmp.path()).is_none());
    }
}
