use serde::{Deserialize, Serialize};

/// Verdict returned to the runtime. This subsystem only observes, so the
/// only variant is approval; failures travel in `reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
}

/// Extra context the runtime attaches to the conversation for some
/// lifecycle points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(rename = "additionalContext")]
    pub additional_context: String,
}

/// The single response object written to the runtime per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResponse {
    pub decision: Decision,
    pub reason: String,
    #[serde(
        rename = "hookSpecificOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hook_specific_output: Option<HookOutput>,
}

impl HookResponse {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Approve,
            reason: reason.into(),
            hook_specific_output: None,
        }
    }

    pub fn with_output(mut self, event_name: &str, context: impl Into<String>) -> Self {
        self.hook_specific_output = Some(HookOutput {
            hook_event_name: event_name.to_string(),
            additional_context: context.into(),
        });
        self
    }
}
