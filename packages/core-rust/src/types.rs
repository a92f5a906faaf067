//! Shared value types carried inside message payloads.
//!
//! These are the structured sub-objects that travel as JSON properties
//! inside the property bag rather than as flat fields.

use serde::{Deserialize, Serialize};

/// Identity of one workflow execution as known to the orchestration engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Caller-chosen or engine-generated workflow id, stable across
    /// continue-as-new restarts.
    pub workflow_id: String,
    /// Engine-generated id of this particular run.
    pub run_id: String,
}

/// Retry policy applied by the engine to workflow or activity attempts.
///
/// Durations are carried as whole milliseconds so the JSON form matches the
/// bag's canonical duration encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval_ms: u64,
    /// Multiplier applied to the interval after each attempt.
    pub backoff_coefficient: f64,
    /// Cap on the computed retry interval.
    pub maximum_interval_ms: u64,
    /// Total attempts including the first; `0` means unlimited.
    pub maximum_attempts: i32,
    /// Engine failure codes that suppress retries entirely.
    #[serde(default)]
    pub non_retryable_error_codes: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            maximum_interval_ms: 60_000,
            maximum_attempts: 0,
            non_retryable_error_codes: Vec::new(),
        }
    }
}

/// Domain metadata returned by describe and carried by update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    /// Engine-reported registration status, e.g. `"REGISTERED"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Workflow history retention in days.
    pub retention_days: i32,
    pub emit_metrics: bool,
}

/// Options accepted when starting a worker for a domain/task-list pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerOptions {
    /// Upper bound on concurrently executing activity tasks.
    pub max_concurrent_activities: u32,
    /// Upper bound on concurrently executing workflow tasks.
    pub max_concurrent_workflows: u32,
    /// Worker identity reported to the engine; empty means host-generated.
    #[serde(default)]
    pub identity: Option<String>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_concurrent_activities: 100,
            max_concurrent_workflows: 50,
            identity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_interval_ms, 1_000);
        assert_eq!(policy.backoff_coefficient, 2.0);
        assert_eq!(policy.maximum_interval_ms, 60_000);
        assert_eq!(policy.maximum_attempts, 0);
        assert!(policy.non_retryable_error_codes.is_empty());
    }

    #[test]
    fn retry_policy_json_roundtrip() {
        let policy = RetryPolicy {
            initial_interval_ms: 250,
            backoff_coefficient: 1.5,
            maximum_interval_ms: 10_000,
            maximum_attempts: 5,
            non_retryable_error_codes: vec!["BadRequest".to_string()],
        };
        let json = serde_json::to_string(&policy).unwrap();
        let back: RetryPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn domain_info_optional_fields_default_to_none() {
        let json = r#"{"name":"orders","retention_days":7,"emit_metrics":false}"#;
        let info: DomainInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "orders");
        assert_eq!(info.description, None);
        assert_eq!(info.owner_email, None);
        assert_eq!(info.status, None);
    }

    #[test]
    fn worker_options_defaults() {
        let opts = WorkerOptions::default();
        assert_eq!(opts.max_concurrent_activities, 100);
        assert_eq!(opts.max_concurrent_workflows, 50);
        assert!(opts.identity.is_none());
    }
}
