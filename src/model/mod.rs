pub mod envelope;
pub mod response;
pub mod workflow;

pub use envelope::{payload_text, CompactTrigger, HookEnvelope};
pub use response::{Decision, HookOutput, HookResponse};
pub use workflow::{
    Checkpoint, Environment, ExpertResult, OrchestrationPattern, RecentState, SessionSummary,
    WorkflowState,
};
