//! Untyped workflow stub.
//!
//! The same dispatch mechanism as the typed stub, but the workflow type,
//! argument encoding, and result decoding are supplied by the caller at
//! the call site. Used when the target workflow is not known at compile
//! time, e.g. cross-language invocation. No argument-shape checking
//! happens locally; a mismatch surfaces only as a remote-reported failure.

use taskmux_core::messages::{
    WorkflowExecuteRequest, WorkflowGetResultRequest, WorkflowQueryRequest, WorkflowSignalRequest,
};
use taskmux_core::{BridgeError, ProxyRequest, ReplyBody, WorkflowExecution};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

/// Untyped stub carrying raw payload bytes end to end.
#[derive(Clone)]
pub struct UntypedWorkflowStub {
    handle: BridgeHandle,
    domain: Option<String>,
    task_list: Option<String>,
}

impl UntypedWorkflowStub {
    #[must_use]
    pub fn new(handle: BridgeHandle) -> Self {
        Self {
            handle,
            domain: None,
            task_list: None,
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_task_list(mut self, task_list: impl Into<String>) -> Self {
        self.task_list = Some(task_list.into());
        self
    }

    /// Starts an execution of a workflow type named at the call site.
    ///
    /// # Errors
    ///
    /// `ProtocolError` when the reply omits the execution identity;
    /// otherwise any operation-local [`BridgeError`].
    pub async fn start(
        &self,
        workflow_type: &str,
        workflow_id: Option<String>,
        args: Option<Vec<u8>>,
    ) -> Result<WorkflowExecution, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowExecute(WorkflowExecuteRequest {
                domain: self.domain.clone(),
                workflow_type: Some(workflow_type.to_string()),
                workflow_id,
                task_list: self.task_list.clone(),
                args,
                execution_start_to_close: None,
                retry_policy: None,
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowExecute(execute) => {
                execute.execution.ok_or_else(|| BridgeError::ProtocolError {
                    detail: "reply missing execution identity".to_string(),
                })
            }
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Delivers a raw signal payload.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn signal(
        &self,
        workflow_id: &str,
        run_id: Option<String>,
        signal_name: &str,
        args: Option<Vec<u8>>,
    ) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowSignal(WorkflowSignalRequest {
                domain: self.domain.clone(),
                workflow_id: Some(workflow_id.to_string()),
                run_id,
                signal_name: Some(signal_name.to_string()),
                signal_args: args,
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowSignal(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Runs a query and returns the raw result payload.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn query(
        &self,
        workflow_id: &str,
        run_id: Option<String>,
        query_name: &str,
        args: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowQuery(WorkflowQueryRequest {
                domain: self.domain.clone(),
                workflow_id: Some(workflow_id.to_string()),
                run_id,
                query_name: Some(query_name.to_string()),
                query_args: args,
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowQuery(query) => Ok(query.result),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Waits for an execution to close and returns its raw result payload.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn result(
        &self,
        workflow_id: &str,
        run_id: Option<String>,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowGetResult(WorkflowGetResultRequest {
                domain: self.domain.clone(),
                workflow_id: Some(workflow_id.to_string()),
                run_id,
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowGetResult(result) => Ok(result.result),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
