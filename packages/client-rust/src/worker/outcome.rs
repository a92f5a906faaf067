//! Workflow invocation outcomes and the continuation signal.

use std::time::Duration;

use taskmux_core::{RemoteError, RetryPolicy};

/// Result of one workflow invocation, returned by user workflow code to
/// the hosting frame.
///
/// Continuation is a distinguished variant rather than an error so that
/// only the hosting frame can observe it; generic error handling in and
/// above user code never sees a restart intent.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// The execution finished with an optional result payload.
    Completed(Option<Vec<u8>>),
    /// The execution wants to restart itself with fresh input.
    ContinueAsNew(ContinuationSignal),
    /// The execution failed.
    Failed(RemoteError),
}

/// Restart parameters carried from user workflow code to the hosting
/// frame.
///
/// Constructed at the moment the workflow decides to restart; consumed
/// exactly once by the hosting frame, which fills every unset field from
/// the current execution before anything reaches the wire. Never
/// serialized directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuationSignal {
    /// Input payload for the new run.
    pub input: Option<Vec<u8>>,
    /// Override target domain; current execution's domain when unset.
    pub domain: Option<String>,
    /// Override task list; current execution's task list when unset.
    pub task_list: Option<String>,
    pub execution_start_to_close: Option<Duration>,
    pub schedule_to_start: Option<Duration>,
    pub schedule_to_close: Option<Duration>,
    pub start_to_close: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
}

impl ContinuationSignal {
    /// A signal carrying only new input, inheriting everything else from
    /// the current execution.
    #[must_use]
    pub fn with_input(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn on_task_list(mut self, task_list: impl Into<String>) -> Self {
        self.task_list = Some(task_list.into());
        self
    }

    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_start_to_close = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }
}
