use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::CompactTrigger;

/// How many distinct experts drove the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestrationPattern {
    #[default]
    Single,
    MultiExpert,
}

/// Workflow state reconstructed from a full transcript scan.
///
/// Recomputed fresh on every request; never cached across invocations.
/// Ordered collections keep artifact serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub experts_used: BTreeSet<String>,
    pub mcps_by_expert: BTreeMap<String, BTreeSet<String>>,
    pub total_mcp_calls: u64,
    pub files_processed: BTreeSet<String>,
    pub orchestration_pattern: OrchestrationPattern,
}

/// Recency-biased state for checkpointing: which experts were active and
/// which files were touched last, most-recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentState {
    pub experts_active: BTreeSet<String>,
    pub recent_files: Vec<String>,
}

/// Process environment captured into a checkpoint for attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub warpio_version: String,
    pub working_dir: String,
}

/// Resumable snapshot written before context compaction. Immutable once
/// written; only the latest-pointer beside it is ever replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub trigger: CompactTrigger,
    pub transcript: String,
    pub environment: Environment,
    pub state: RecentState,
    pub resume_instructions: Vec<String>,
    pub session_id: String,
}

/// Terminal artifact written once per session-stop event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub state: WorkflowState,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub warpio_version: String,
}

/// One line of the per-session expert-result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertResult {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub expert: String,
    pub mcps_used: Vec<String>,
    pub mcp_count: usize,
}
