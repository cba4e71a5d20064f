use std::fmt;
use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::EnvelopeError;

/// Cause of a pre-compaction event.
///
/// Unknown values decode as `Manual` rather than failing the envelope: the
/// runtime may grow new trigger kinds and a hook must keep working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompactTrigger {
    #[default]
    Manual,
    Auto,
}

impl CompactTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactTrigger::Manual => "manual",
            CompactTrigger::Auto => "auto",
        }
    }
}

impl fmt::Display for CompactTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for CompactTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompactTrigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "auto" => CompactTrigger::Auto,
            _ => CompactTrigger::Manual,
        })
    }
}

/// The payload a lifecycle handler receives from the runtime.
///
/// Every field is optional on the wire; absent fields decode to innocuous
/// defaults. `tool_input`, `tool_output` and `result` are opaque to this
/// subsystem and only ever string-previewed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HookEnvelope {
    pub session_id: String,
    pub tool_name: String,
    pub subagent_name: String,
    pub tool_input: Value,
    pub tool_output: Value,
    pub result: Value,
    pub transcript_path: String,
    pub trigger: CompactTrigger,
}

impl HookEnvelope {
    /// Decodes one envelope from raw text.
    ///
    /// Malformed input is an `EnvelopeError`; callers convert it into a
    /// default envelope plus a diagnostic reason so the response step is
    /// always reached.
    pub fn decode(input: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(input.trim()).map_err(|e| EnvelopeError::Json(e.to_string()))
    }

    /// Reads the invocation channel to EOF and decodes one envelope.
    pub fn read_from(reader: &mut impl Read) -> Result<Self, EnvelopeError> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|e| EnvelopeError::Io(e.to_string()))?;
        Self::decode(&buf)
    }
}

/// String rendering of an opaque payload value, for previews.
///
/// Null renders empty, strings render bare, everything else renders as
/// compact JSON.
pub fn payload_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
