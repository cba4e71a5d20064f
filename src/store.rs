//! Durable, best-effort workflow logs.
//!
//! One file per record kind per UTC calendar day, one JSON record per line.
//! Appends are single `write_all` calls of one newline-terminated line, so
//! concurrent hook invocations interleave only at line granularity. Every
//! failure is reported as a `StoreError` and the caller drops it: logging
//! never blocks the observed tool.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HookConfig;
use crate::error::StoreError;

/// Shared default log location, matching what the hooks' consumers expect.
const SHARED_LOG_DIR: &str = "/tmp/warpio-workflows";

/// The record kinds this subsystem appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Pre-tool-use task records.
    Tasks,
    /// Post-tool-use performance metrics.
    Metrics,
    /// Subagent completion results.
    SubagentResults,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Tasks => "tasks",
            LogKind::Metrics => "metrics",
            LogKind::SubagentResults => "subagent_results",
        }
    }
}

/// A resolved, probed log directory. Resolution happens once per invocation
/// and the result is carried in the value; there is no process-global cache
/// because each invocation is a fresh process.
#[derive(Debug, Clone)]
pub struct LogDir {
    dir: PathBuf,
}

impl LogDir {
    /// Resolves the first writable candidate directory, in order: the
    /// `WORKFLOW_DIR` override, the shared temp directory, a home-rooted
    /// fallback, the working directory.
    ///
    /// Writability is verified by a real write-then-delete probe, not by
    /// permission bits.
    pub fn resolve(config: &HookConfig) -> Result<Self, StoreError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(dir) = &config.workflow_dir {
            candidates.push(dir.clone());
        }
        candidates.push(PathBuf::from(SHARED_LOG_DIR));
        if let Some(home) = &config.home_dir {
            candidates.push(home.join(".warpio").join("logs"));
        }
        candidates.push(config.working_dir.clone());

        candidates
            .into_iter()
            .find(|dir| probe_writable(dir))
            .map(|dir| Self { dir })
            .ok_or(StoreError::NoWritableDir)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Appends one record to today's file for `kind` and returns the file
    /// path written to.
    pub fn append<T: Serialize>(&self, kind: LogKind, record: &T) -> Result<PathBuf, StoreError> {
        self.append_at(kind, record, Utc::now())
    }

    fn append_at<T: Serialize>(
        &self,
        kind: LogKind,
        record: &T,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, StoreError> {
        let file = self
            .dir
            .join(format!("{}_{}.jsonl", kind.as_str(), now.format("%Y%m%d")));

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
            .and_then(|mut f| f.write_all(line.as_bytes()))
            .map_err(|e| StoreError::io(&file, e))?;

        Ok(file)
    }
}

/// Creates the directory if needed and proves it writable with a throwaway
/// file. The probe name carries the pid so concurrent invocations probing
/// the same directory cannot clobber each other.
fn probe_writable(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(format!(".write-probe-{}", std::process::id()));
    if fs::write(&probe, b"probe").is_err() {
        return false;
    }
    let _ = fs::remove_file(&probe);
    true
}

/// One persisted line per observed pre-tool-use event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub input_preview: String,
    pub session_id: String,
}

/// One persisted line per tracked post-tool-use event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub output_size: usize,
}

/// One persisted line per subagent completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub timestamp: DateTime<Utc>,
    pub subagent: String,
    pub result_preview: String,
}
