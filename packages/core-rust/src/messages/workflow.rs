//! Workflow request/reply pairs: execution, signalling, querying, result
//! retrieval, continue-as-new, and the proxy-driven invocation pair.

use std::time::Duration;

use super::PayloadSchema;
use crate::properties::PropertyBag;
use crate::types::{RetryPolicy, WorkflowExecution};

// ---------------------------------------------------------------------------
// Execute
// ---------------------------------------------------------------------------

/// Starts a new workflow execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowExecuteRequest {
    pub domain: Option<String>,
    /// Registered workflow type name.
    pub workflow_type: Option<String>,
    /// Caller-chosen workflow id; the engine generates one when absent.
    pub workflow_id: Option<String>,
    pub task_list: Option<String>,
    /// Opaque input payload handed to the workflow entry point.
    pub args: Option<Vec<u8>>,
    /// Overall execution deadline; engine default when absent.
    pub execution_start_to_close: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
}

impl PayloadSchema for WorkflowExecuteRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowType", self.workflow_type.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("TaskList", self.task_list.clone());
        bag.set_bytes("Args", self.args.as_deref());
        bag.set_opt_duration(
            "ExecutionStartToCloseTimeout",
            self.execution_start_to_close,
        );
        bag.set_json("RetryPolicy", self.retry_policy.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_type: bag.get_opt_string("WorkflowType"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            task_list: bag.get_opt_string("TaskList"),
            args: bag.get_bytes("Args"),
            execution_start_to_close: bag.get_opt_duration("ExecutionStartToCloseTimeout"),
            retry_policy: bag.get_json("RetryPolicy"),
        }
    }
}

/// Identity of the started execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowExecuteReply {
    pub execution: Option<WorkflowExecution>,
}

impl PayloadSchema for WorkflowExecuteReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_json("Execution", self.execution.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            execution: bag.get_json("Execution"),
        }
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// Delivers a signal to a running execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSignalRequest {
    pub domain: Option<String>,
    pub workflow_id: Option<String>,
    /// Targets the latest run when absent.
    pub run_id: Option<String>,
    pub signal_name: Option<String>,
    pub signal_args: Option<Vec<u8>>,
}

impl PayloadSchema for WorkflowSignalRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
        bag.set_opt_string("SignalName", self.signal_name.clone());
        bag.set_bytes("SignalArgs", self.signal_args.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
            signal_name: bag.get_opt_string("SignalName"),
            signal_args: bag.get_bytes("SignalArgs"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowSignalReply;

impl PayloadSchema for WorkflowSignalReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Runs a read-only query against a workflow's current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowQueryRequest {
    pub domain: Option<String>,
    pub workflow_id: Option<String>,
    pub run_id: Option<String>,
    pub query_name: Option<String>,
    pub query_args: Option<Vec<u8>>,
}

impl PayloadSchema for WorkflowQueryRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
        bag.set_opt_string("QueryName", self.query_name.clone());
        bag.set_bytes("QueryArgs", self.query_args.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
            query_name: bag.get_opt_string("QueryName"),
            query_args: bag.get_bytes("QueryArgs"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowQueryReply {
    pub result: Option<Vec<u8>>,
}

impl PayloadSchema for WorkflowQueryReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("Result", self.result.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            result: bag.get_bytes("Result"),
        }
    }
}

// ---------------------------------------------------------------------------
// GetResult
// ---------------------------------------------------------------------------

/// Waits for an execution to close and returns its result payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowGetResultRequest {
    pub domain: Option<String>,
    pub workflow_id: Option<String>,
    pub run_id: Option<String>,
}

impl PayloadSchema for WorkflowGetResultRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowGetResultReply {
    pub result: Option<Vec<u8>>,
}

impl PayloadSchema for WorkflowGetResultReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("Result", self.result.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            result: bag.get_bytes("Result"),
        }
    }
}

// ---------------------------------------------------------------------------
// ContinueAsNew
// ---------------------------------------------------------------------------

/// Completes the current execution and atomically starts a fresh one with
/// new input, preserving workflow identity.
///
/// Built by the workflow hosting frame from a continuation signal; absent
/// overrides have already been filled from the current execution by the
/// time this message is constructed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowContinueAsNewRequest {
    pub domain: Option<String>,
    pub workflow_id: Option<String>,
    /// Run being completed, so the engine can chain the new run to it.
    pub run_id: Option<String>,
    pub task_list: Option<String>,
    /// Input payload for the new run.
    pub args: Option<Vec<u8>>,
    pub execution_start_to_close: Option<Duration>,
    pub schedule_to_start: Option<Duration>,
    pub schedule_to_close: Option<Duration>,
    pub start_to_close: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
}

impl PayloadSchema for WorkflowContinueAsNewRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
        bag.set_opt_string("TaskList", self.task_list.clone());
        bag.set_bytes("Args", self.args.as_deref());
        bag.set_opt_duration(
            "ExecutionStartToCloseTimeout",
            self.execution_start_to_close,
        );
        bag.set_opt_duration("ScheduleToStartTimeout", self.schedule_to_start);
        bag.set_opt_duration("ScheduleToCloseTimeout", self.schedule_to_close);
        bag.set_opt_duration("StartToCloseTimeout", self.start_to_close);
        bag.set_json("RetryPolicy", self.retry_policy.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
            task_list: bag.get_opt_string("TaskList"),
            args: bag.get_bytes("Args"),
            execution_start_to_close: bag.get_opt_duration("ExecutionStartToCloseTimeout"),
            schedule_to_start: bag.get_opt_duration("ScheduleToStartTimeout"),
            schedule_to_close: bag.get_opt_duration("ScheduleToCloseTimeout"),
            start_to_close: bag.get_opt_duration("StartToCloseTimeout"),
            retry_policy: bag.get_json("RetryPolicy"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowContinueAsNewReply;

impl PayloadSchema for WorkflowContinueAsNewReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Invoke (proxy -> client)
// ---------------------------------------------------------------------------

/// Proxy-driven request to run a registered workflow function. The reply
/// echoes the proxy's correlation id rather than one allocated locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowInvokeRequest {
    pub domain: Option<String>,
    pub workflow_id: Option<String>,
    pub run_id: Option<String>,
    pub workflow_type: Option<String>,
    pub task_list: Option<String>,
    pub args: Option<Vec<u8>>,
    pub execution_start_to_close: Option<Duration>,
}

impl PayloadSchema for WorkflowInvokeRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
        bag.set_opt_string("WorkflowType", self.workflow_type.clone());
        bag.set_opt_string("TaskList", self.task_list.clone());
        bag.set_bytes("Args", self.args.as_deref());
        bag.set_opt_duration(
            "ExecutionStartToCloseTimeout",
            self.execution_start_to_close,
        );
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
            workflow_type: bag.get_opt_string("WorkflowType"),
            task_list: bag.get_opt_string("TaskList"),
            args: bag.get_bytes("Args"),
            execution_start_to_close: bag.get_opt_duration("ExecutionStartToCloseTimeout"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowInvokeReply {
    pub result: Option<Vec<u8>>,
}

impl PayloadSchema for WorkflowInvokeReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("Result", self.result.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            result: bag.get_bytes("Result"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
