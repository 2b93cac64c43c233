//! Check definitions and execution directives.

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// A check definition, as carried in events and execution requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Check {
    pub metadata: ObjectMeta,
    /// Command the agent executes.
    pub command: String,
    /// Scheduling interval in seconds.
    pub interval: u32,
    /// Execution timeout in seconds.
    pub timeout: u32,
    /// Subscriptions the check fans out to.
    pub subscriptions: Vec<String>,
    /// Exit status of the last execution.
    pub status: u32,
    /// Output of the last execution.
    pub output: String,
}

impl Check {
    /// A named check with no command or schedule.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name, namespace),
            ..Self::default()
        }
    }
}

/// A check execution directive, published on a subscription topic and
/// forwarded by agent sessions to their agents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckRequest {
    /// The check to execute.
    pub config: Check,
    /// Unix timestamp at which the request was issued.
    pub issued: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_check_identity() {
        let check = Check::new("disk", "default");
        assert_eq!(check.metadata.name, "disk");
        assert_eq!(check.metadata.namespace, "default");
        assert!(check.command.is_empty());
    }

    #[test]
    fn check_request_roundtrip() {
        let request = CheckRequest {
            config: Check::new("disk", "default"),
            issued: 1_700_000_000,
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: CheckRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn check_request_deserializes_without_issued() {
        let request: CheckRequest =
            serde_json::from_str(r#"{"config":{"metadata":{"name":"disk"}}}"#).unwrap();
        assert_eq!(request.config.metadata.name, "disk");
        assert_eq!(request.issued, 0);
    }
}
