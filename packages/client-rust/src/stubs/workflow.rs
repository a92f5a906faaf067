//! Typed workflow stub.
//!
//! Built from a statically declared input/result pair: each method maps to
//! exactly one request variant, encodes its arguments as JSON payloads, and
//! decodes the reply into the declared result shape. Argument and result
//! mismatches against the remote implementation surface locally as
//! `ProtocolError` at decode time or remotely as `Remote` failures.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use taskmux_core::messages::{
    WorkflowExecuteRequest, WorkflowGetResultRequest, WorkflowQueryRequest, WorkflowSignalRequest,
};
use taskmux_core::{
    BridgeError, ProxyRequest, ReplyBody, RetryPolicy, WorkflowExecution,
};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, BridgeError> {
    serde_json::to_vec(value).map_err(|err| BridgeError::ProtocolError {
        detail: format!("argument encoding failed: {err}"),
    })
}

pub(crate) fn decode_json<T: DeserializeOwned>(payload: Option<Vec<u8>>) -> Result<T, BridgeError> {
    let bytes = payload.ok_or_else(|| BridgeError::ProtocolError {
        detail: "missing result payload".to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| BridgeError::ProtocolError {
        detail: format!("result decoding failed: {err}"),
    })
}

/// Typed stub bound to one workflow type with input `I` and result `R`.
pub struct WorkflowStub<I, R> {
    handle: BridgeHandle,
    workflow_type: String,
    domain: Option<String>,
    task_list: Option<String>,
    execution_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    _shape: PhantomData<fn(I) -> R>,
}

impl<I, R> WorkflowStub<I, R>
where
    I: Serialize,
    R: DeserializeOwned,
{
    #[must_use]
    pub fn new(handle: BridgeHandle, workflow_type: impl Into<String>) -> Self {
        let retry_policy = handle.config().default_retry_policy.clone();
        Self {
            handle,
            workflow_type: workflow_type.into(),
            domain: None,
            task_list: None,
            execution_timeout: None,
            retry_policy,
            _shape: PhantomData,
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

    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Starts a new execution with the given input. A workflow id is
    /// generated when the caller does not pin one via `workflow_id`.
    ///
    /// # Errors
    ///
    /// `ProtocolError` when the input fails to encode or the reply omits
    /// the execution identity; otherwise any operation-local
    /// [`BridgeError`].
    pub async fn start(&self, input: &I) -> Result<WorkflowRun<R>, BridgeError> {
        self.start_with_id(uuid::Uuid::new_v4().to_string(), input)
            .await
    }

    /// Starts a new execution under a caller-chosen workflow id.
    ///
    /// # Errors
    ///
    /// See [`Self::start`].
    pub async fn start_with_id(
        &self,
        workflow_id: impl Into<String>,
        input: &I,
    ) -> Result<WorkflowRun<R>, BridgeError> {
        let request = WorkflowExecuteRequest {
            domain: self.domain.clone(),
            workflow_type: Some(self.workflow_type.clone()),
            workflow_id: Some(workflow_id.into()),
            task_list: self.task_list.clone(),
            args: Some(encode_json(input)?),
            execution_start_to_close: self.execution_timeout,
            retry_policy: self.retry_policy.clone(),
        };
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowExecute(request))
            .await?;
        let execution = match reply.body {
            ReplyBody::WorkflowExecute(ref execute) => execute.execution.clone(),
            _ => return Err(unexpected_reply(&reply)),
        };
        let execution = execution.ok_or_else(|| BridgeError::ProtocolError {
            detail: "reply missing execution identity".to_string(),
        })?;
        Ok(WorkflowRun {
            handle: self.handle.clone(),
            domain: self.domain.clone(),
            execution,
            _result: PhantomData,
        })
    }

    /// Signals the latest run of an execution by workflow id.
    ///
    /// # Errors
    ///
    /// `ProtocolError` when the signal payload fails to encode; otherwise
    /// any operation-local [`BridgeError`].
    pub async fn signal<S: Serialize>(
        &self,
        workflow_id: &str,
        signal_name: &str,
        args: &S,
    ) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowSignal(WorkflowSignalRequest {
                domain: self.domain.clone(),
                workflow_id: Some(workflow_id.to_string()),
                run_id: None,
                signal_name: Some(signal_name.to_string()),
                signal_args: Some(encode_json(args)?),
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowSignal(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Queries the latest run of an execution by workflow id.
    ///
    /// # Errors
    ///
    /// `ProtocolError` on argument/result shape problems; otherwise any
    /// operation-local [`BridgeError`].
    pub async fn query<Q: Serialize, V: DeserializeOwned>(
        &self,
        workflow_id: &str,
        query_name: &str,
        args: &Q,
    ) -> Result<V, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowQuery(WorkflowQueryRequest {
                domain: self.domain.clone(),
                workflow_id: Some(workflow_id.to_string()),
                run_id: None,
                query_name: Some(query_name.to_string()),
                query_args: Some(encode_json(args)?),
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowQuery(query) => decode_json(query.result),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

/// Handle to one started execution, parameterized by the result shape.
pub struct WorkflowRun<R> {
    handle: BridgeHandle,
    domain: Option<String>,
    execution: WorkflowExecution,
    _result: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for WorkflowRun<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRun")
            .field("domain", &self.domain)
            .field("execution", &self.execution)
            .finish()
    }
}

impl<R: DeserializeOwned> WorkflowRun<R> {
    /// Identity of the underlying execution.
    #[must_use]
    pub fn execution(&self) -> &WorkflowExecution {
        &self.execution
    }

    /// Suspends until the execution closes and decodes its result.
    ///
    /// # Errors
    ///
    /// `ProtocolError` when the result fails to decode; otherwise any
    /// operation-local [`BridgeError`].
    pub async fn result(&self) -> Result<R, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::WorkflowGetResult(WorkflowGetResultRequest {
                domain: self.domain.clone(),
                workflow_id: Some(self.execution.workflow_id.clone()),
                run_id: Some(self.execution.run_id.clone()),
            }))
            .await?;
        match reply.body {
            ReplyBody::WorkflowGetResult(result) => decode_json(result.result),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use taskmux_core::messages::{
        WorkflowExecuteReply, WorkflowGetResultReply, WorkflowQueryReply,
    };
    use taskmux_core::{Envelope, ProxyMessage, ProxyReply, RemoteError, TypeRegistry};

    use super::*;
    use crate::bridge::Bridge;
    use crate::config::BridgeConfig;
    use crate::test_support::{default_reply, ScriptedProxy};

    #[derive(Debug, Serialize)]
    struct OrderInput {
        sku: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct OrderResult {
        shipped: bool,
    }

    fn scripted_engine(envelope: &Envelope) -> Vec<Envelope> {
        let ProxyMessage::Request(request) = &envelope.message else {
            return Vec::new();
        };
        let reply = match request {
            ProxyRequest::WorkflowExecute(execute) => {
                // Input must already be encoded JSON.
                let args = execute.args.clone().unwrap();
                assert!(serde_json::from_slice::<serde_json::Value>(&args).is_ok());
                ProxyReply::ok(ReplyBody::WorkflowExecute(WorkflowExecuteReply {
                    execution: Some(WorkflowExecution {
                        workflow_id: execute.workflow_id.clone().unwrap(),
                        run_id: "run-7".to_string(),
                    }),
                }))
            }
            ProxyRequest::WorkflowGetResult(_) => {
                ProxyReply::ok(ReplyBody::WorkflowGetResult(WorkflowGetResultReply {
                    result: Some(b"{\"shipped\":true}".to_vec()),
                }))
            }
            ProxyRequest::WorkflowQuery(query) => {
                assert_eq!(query.query_name.as_deref(), Some("status"));
                ProxyReply::ok(ReplyBody::WorkflowQuery(WorkflowQueryReply {
                    result: Some(b"\"SHIPPED\"".to_vec()),
                }))
            }
            other => default_reply(other),
        };
        vec![Envelope::reply(envelope.correlation_id, reply)]
    }

    fn start_stub() -> (WorkflowStub<OrderInput, OrderResult>, ScriptedProxy) {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let proxy = ScriptedProxy::spawn(peer, scripted_engine);
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());
        let stub = WorkflowStub::new(handle, "ProcessOrder")
            .with_domain("orders")
            .with_task_list("fulfillment")
            .with_execution_timeout(Duration::from_secs(3600));
        (stub, proxy)
    }

    #[tokio::test]
    async fn start_and_fetch_result() {
        let (stub, _proxy) = start_stub();
        let run = stub
            .start_with_id(
                "order-1001",
                &OrderInput {
                    sku: "x".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(run.execution().workflow_id, "order-1001");
        assert_eq!(run.execution().run_id, "run-7");

        let result = run.result().await.unwrap();
        assert_eq!(result, OrderResult { shipped: true });
    }

    #[tokio::test]
    async fn start_generates_workflow_id_when_unpinned() {
        let (stub, _proxy) = start_stub();
        let run = stub
            .start(&OrderInput {
                sku: "y".to_string(),
            })
            .await
            .unwrap();
        assert!(!run.execution().workflow_id.is_empty());
    }

    #[tokio::test]
    async fn signal_and_query_round_trip() {
        let (stub, _proxy) = start_stub();
        stub.signal("order-1001", "expedite", &serde_json::json!({"tier": 1}))
            .await
            .unwrap();
        let status: String = stub
            .query("order-1001", "status", &serde_json::json!(null))
            .await
            .unwrap();
        assert_eq!(status, "SHIPPED");
    }

    #[tokio::test]
    async fn remote_failure_maps_to_typed_error() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, |envelope| {
            let ProxyMessage::Request(request) = &envelope.message else {
                return Vec::new();
            };
            let mut reply = default_reply(request);
            reply.error = Some(RemoteError::new("WorkflowExecutionAlreadyStarted", "dup"));
            vec![Envelope::reply(envelope.correlation_id, reply)]
        });
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());
        let stub: WorkflowStub<OrderInput, OrderResult> =
            WorkflowStub::new(handle, "ProcessOrder");

        let err = stub
            .start_with_id(
                "order-1001",
                &OrderInput {
                    sku: "x".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::Remote(RemoteError::new(
                "WorkflowExecutionAlreadyStarted",
                "dup"
            ))
        );
    }
}
