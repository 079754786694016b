// src/envelope.rs
// =============================================================================
// The error envelope: the one shape every handled failure takes.
//
// Callers on the other side of the tool boundary are language-model agents,
// not Rust code. They can't catch exceptions, so every failure we know how to
// handle is returned as plain data:
//
//   {"error": {"message": "...", "details": {...}}}
//
// `details` is optional and omitted from the JSON when empty.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A structured, serializable failure value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// The payload inside the `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                details: None,
            },
        }
    }

    // Attaches a details object. An empty map is treated as "no details"
    // so the JSON output never carries `"details": {}`.
    pub fn with_details(message: impl Into<String>, details: Map<String, Value>) -> Self {
        let details = if details.is_empty() { None } else { Some(details) };
        Self {
            error: ErrorBody {
                message: message.into(),
                details,
            },
        }
    }

    // Used by the outermost tool guard when something escaped the core as a
    // hard failure. The error type name goes into details so the agent can
    // tell a network fault from a decoding problem.
    pub fn from_failure(tool: &str, kind: &str, err: &dyn fmt::Display) -> Self {
        let mut details = Map::new();
        details.insert("type".to_string(), Value::String(kind.to_string()));
        details.insert("message".to_string(), Value::String(err.to_string()));
        Self::with_details(format!("{}: unexpected error", tool), details)
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.error.details.as_ref()
    }

    /// Returns true if a raw JSON value looks like an envelope.
    pub fn is_envelope(value: &Value) -> bool {
        value
            .as_object()
            .map(|obj| obj.contains_key("error"))
            .unwrap_or(false)
    }

    pub fn to_value(&self) -> Value {
        // Serializing a struct of strings and maps can't fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error.message)
    }
}

// Small helper for building details maps from string pairs.
pub(crate) fn details<const N: usize>(pairs: [(&str, &str); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_without_details_serializes_message_only() {
        let env = ErrorEnvelope::new("GitHub URL is empty.");
        assert_eq!(
            env.to_value(),
            json!({"error": {"message": "GitHub URL is empty."}})
        );
    }

    #[test]
    fn test_envelope_with_details() {
        let env = ErrorEnvelope::with_details(
            "Module 'src' does not exist.",
            details([("owner", "alice"), ("repo", "widgets")]),
        );
        assert_eq!(
            env.to_value(),
            json!({"error": {
                "message": "Module 'src' does not exist.",
                "details": {"owner": "alice", "repo": "widgets"}
            }})
        );
    }

    #[test]
    fn test_empty_details_are_dropped() {
        let env = ErrorEnvelope::with_details("boom", Map::new());
        assert!(env.details().is_none());
    }

    #[test]
    fn test_from_failure_names_the_tool() {
        let env = ErrorEnvelope::from_failure("read_file_content", "transport", &"connection reset");
        assert_eq!(env.message(), "read_file_content: unexpected error");
        let details = env.details().unwrap();
        assert_eq!(details["type"], "transport");
        assert_eq!(details["message"], "connection reset");
    }

    #[test]
    fn test_is_envelope() {
        assert!(ErrorEnvelope::is_envelope(&json!({"error": {"message": "x"}})));
        assert!(!ErrorEnvelope::is_envelope(&json!({"src": {}})));
        assert!(!ErrorEnvelope::is_envelope(&json!("error")));
    }
}
