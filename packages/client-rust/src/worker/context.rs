//! Invocation contexts handed to user workflow and activity functions.

use std::time::Duration;

use taskmux_core::messages::{ActivityInvokeRequest, WorkflowInvokeRequest};
use taskmux_core::BridgeError;

use crate::stubs::ActivityStub;

/// Identity and parameters of the workflow execution being invoked.
///
/// The hosting frame also reads this to fill fields a continuation signal
/// leaves unset.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    domain: Option<String>,
    workflow_id: Option<String>,
    run_id: Option<String>,
    workflow_type: Option<String>,
    task_list: Option<String>,
    execution_timeout: Option<Duration>,
    input: Option<Vec<u8>>,
}

impl WorkflowContext {
    pub(crate) fn from_invoke(invoke: &WorkflowInvokeRequest) -> Self {
        Self {
            domain: invoke.domain.clone(),
            workflow_id: invoke.workflow_id.clone(),
            run_id: invoke.run_id.clone(),
            workflow_type: invoke.workflow_type.clone(),
            task_list: invoke.task_list.clone(),
            execution_timeout: invoke.execution_start_to_close,
            input: invoke.args.clone(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[must_use]
    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    #[must_use]
    pub fn workflow_type(&self) -> Option<&str> {
        self.workflow_type.as_deref()
    }

    #[must_use]
    pub fn task_list(&self) -> Option<&str> {
        self.task_list.as_deref()
    }

    #[must_use]
    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout
    }

    /// Raw input payload for this invocation.
    #[must_use]
    pub fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    pub(crate) fn domain_owned(&self) -> Option<String> {
        self.domain.clone()
    }

    pub(crate) fn task_list_owned(&self) -> Option<String> {
        self.task_list.clone()
    }

    pub(crate) fn workflow_id_owned(&self) -> Option<String> {
        self.workflow_id.clone()
    }

    pub(crate) fn run_id_owned(&self) -> Option<String> {
        self.run_id.clone()
    }
}

/// Context handed to user activity functions, with heartbeat access.
#[derive(Clone)]
pub struct ActivityContext {
    stub: ActivityStub,
    activity_id: Option<String>,
    activity_type: Option<String>,
    task_token: Option<Vec<u8>>,
    input: Option<Vec<u8>>,
}

impl ActivityContext {
    pub(crate) fn from_invoke(stub: ActivityStub, invoke: &ActivityInvokeRequest) -> Self {
        Self {
            stub,
            activity_id: invoke.activity_id.clone(),
            activity_type: invoke.activity_type.clone(),
            task_token: invoke.task_token.clone(),
            input: invoke.args.clone(),
        }
    }

    #[must_use]
    pub fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }

    #[must_use]
    pub fn activity_type(&self) -> Option<&str> {
        self.activity_type.as_deref()
    }

    #[must_use]
    pub fn task_token(&self) -> Option<&[u8]> {
        self.task_token.as_deref()
    }

    #[must_use]
    pub fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    /// Records a heartbeat for this attempt through the bridge.
    ///
    /// # Errors
    ///
    /// `ProtocolError` when the invocation carried no task token;
    /// otherwise any operation-local [`BridgeError`].
    pub async fn record_heartbeat(&self, details: Option<Vec<u8>>) -> Result<(), BridgeError> {
        let token = self
            .task_token
            .as_deref()
            .ok_or_else(|| BridgeError::ProtocolError {
                detail: "activity invocation carried no task token".to_string(),
            })?;
        self.stub.record_heartbeat(token, details).await
    }
}
