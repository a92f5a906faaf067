//! Worker dispatcher and invocation hosting frames.
//!
//! The dispatcher drains proxy-driven requests off the bridge's inbound
//! stream and runs each invocation on its own task. The workflow hosting
//! frame is the single place that consumes a continuation signal: it
//! translates the signal into a continue-as-new request, fills every unset
//! field from the current execution, submits it through the correlation
//! engine, and then completes the invocation normally.

use std::sync::Arc;

use anyhow::Context as _;
use taskmux_core::messages::{
    ActivityInvokeReply, ActivityInvokeRequest, WorkflowContinueAsNewRequest,
    WorkflowInvokeReply, WorkflowInvokeRequest,
};
use taskmux_core::{
    Envelope, ProxyMessage, ProxyReply, ProxyRequest, RemoteError, ReplyBody,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::context::{ActivityContext, WorkflowContext};
use super::outcome::{ContinuationSignal, WorkflowOutcome};
use super::registry::WorkerRegistry;
use crate::bridge::BridgeHandle;
use crate::stubs::ActivityStub;

/// A running dispatcher bound to one bridge.
pub struct Worker {
    join: JoinHandle<()>,
}

impl Worker {
    /// Claims the bridge's inbound stream and starts dispatching.
    ///
    /// # Errors
    ///
    /// Fails when another worker already claimed the stream.
    pub fn spawn(handle: BridgeHandle, registry: Arc<WorkerRegistry>) -> anyhow::Result<Self> {
        let inbound = handle
            .take_inbound()
            .context("bridge inbound stream already claimed")?;
        let join = tokio::spawn(run_dispatch(handle, registry, inbound));
        Ok(Self { join })
    }

    /// Stops dispatching immediately. In-flight invocations on their own
    /// tasks run to completion.
    pub fn abort(&self) {
        self.join.abort();
    }
}

async fn run_dispatch(
    handle: BridgeHandle,
    registry: Arc<WorkerRegistry>,
    mut inbound: mpsc::Receiver<Envelope>,
) {
    while let Some(envelope) = inbound.recv().await {
        let correlation_id = envelope.correlation_id;
        match envelope.message {
            ProxyMessage::Request(ProxyRequest::WorkflowInvoke(invoke)) => {
                tokio::spawn(host_workflow(
                    handle.clone(),
                    registry.clone(),
                    correlation_id,
                    invoke,
                ));
            }
            ProxyMessage::Request(ProxyRequest::ActivityInvoke(invoke)) => {
                tokio::spawn(host_activity(
                    handle.clone(),
                    registry.clone(),
                    correlation_id,
                    invoke,
                ));
            }
            ProxyMessage::Request(other) => {
                tracing::warn!(
                    correlation_id,
                    message_type = ?other.message_type(),
                    "unexpected inbound request"
                );
            }
            ProxyMessage::Reply(reply) => {
                // Replies are routed by the transport; one landing here is
                // a dispatch bug.
                tracing::warn!(
                    correlation_id,
                    message_type = ?reply.message_type(),
                    "reply reached worker dispatcher"
                );
            }
        }
    }
    tracing::debug!("inbound stream closed, worker dispatcher exiting");
}

// ---------------------------------------------------------------------------
// Workflow hosting frame
// ---------------------------------------------------------------------------

async fn host_workflow(
    handle: BridgeHandle,
    registry: Arc<WorkerRegistry>,
    correlation_id: u64,
    invoke: WorkflowInvokeRequest,
) {
    let workflow_type = invoke.workflow_type.clone().unwrap_or_default();
    let Some(func) = registry.workflow(&workflow_type) else {
        tracing::warn!(correlation_id, %workflow_type, "no registered workflow");
        send_invoke_reply(
            &handle,
            correlation_id,
            ProxyReply::failed(
                ReplyBody::WorkflowInvoke(WorkflowInvokeReply::default()),
                RemoteError::new("UnknownWorkflowType", workflow_type),
            ),
        )
        .await;
        return;
    };

    let ctx = WorkflowContext::from_invoke(&invoke);
    let outcome = func(ctx.clone()).await;

    let reply = match outcome {
        WorkflowOutcome::Completed(result) => {
            ProxyReply::ok(ReplyBody::WorkflowInvoke(WorkflowInvokeReply { result }))
        }
        WorkflowOutcome::Failed(error) => ProxyReply::failed(
            ReplyBody::WorkflowInvoke(WorkflowInvokeReply::default()),
            error,
        ),
        WorkflowOutcome::ContinueAsNew(signal) => {
            continue_as_new(&handle, &ctx, signal).await
        }
    };
    send_invoke_reply(&handle, correlation_id, reply).await;
}

/// Turns a continuation signal into a continue-as-new request and submits
/// it. On success the current invocation completes normally; a restart
/// that cannot be requested is a fatal failure of the current execution,
/// never silently retried here.
async fn continue_as_new(
    handle: &BridgeHandle,
    ctx: &WorkflowContext,
    signal: ContinuationSignal,
) -> ProxyReply {
    let request = continuation_request(ctx, signal);
    match handle
        .submit(ProxyRequest::WorkflowContinueAsNew(request))
        .await
    {
        Ok(_) => {
            tracing::debug!(
                workflow_id = ctx.workflow_id().unwrap_or(""),
                "continue-as-new accepted"
            );
            ProxyReply::ok(ReplyBody::WorkflowInvoke(WorkflowInvokeReply {
                result: None,
            }))
        }
        Err(err) => {
            tracing::error!(
                workflow_id = ctx.workflow_id().unwrap_or(""),
                %err,
                "continue-as-new request failed"
            );
            ProxyReply::failed(
                ReplyBody::WorkflowInvoke(WorkflowInvokeReply::default()),
                RemoteError::new("ContinueAsNewFailed", err.to_string()),
            )
        }
    }
}

/// Fields left unset in the signal inherit the current execution's values.
fn continuation_request(
    ctx: &WorkflowContext,
    signal: ContinuationSignal,
) -> WorkflowContinueAsNewRequest {
    WorkflowContinueAsNewRequest {
        domain: signal.domain.or_else(|| ctx.domain_owned()),
        workflow_id: ctx.workflow_id_owned(),
        run_id: ctx.run_id_owned(),
        task_list: signal.task_list.or_else(|| ctx.task_list_owned()),
        args: signal.input,
        execution_start_to_close: signal
            .execution_start_to_close
            .or_else(|| ctx.execution_timeout()),
        schedule_to_start: signal.schedule_to_start,
        schedule_to_close: signal.schedule_to_close,
        start_to_close: signal.start_to_close,
        retry_policy: signal.retry_policy,
    }
}

async fn send_invoke_reply(handle: &BridgeHandle, correlation_id: u64, reply: ProxyReply) {
    if handle.send_reply(correlation_id, reply).await.is_err() {
        tracing::debug!(correlation_id, "invoke reply dropped, transport closed");
    }
}

// ---------------------------------------------------------------------------
// Activity hosting frame
// ---------------------------------------------------------------------------

async fn host_activity(
    handle: BridgeHandle,
    registry: Arc<WorkerRegistry>,
    correlation_id: u64,
    invoke: ActivityInvokeRequest,
) {
    let activity_type = invoke.activity_type.clone().unwrap_or_default();
    let Some(func) = registry.activity(&activity_type) else {
        tracing::warn!(correlation_id, %activity_type, "no registered activity");
        send_invoke_reply(
            &handle,
            correlation_id,
            ProxyReply::failed(
                ReplyBody::ActivityInvoke(ActivityInvokeReply::default()),
                RemoteError::new("UnknownActivityType", activity_type),
            ),
        )
        .await;
        return;
    };

    let ctx = ActivityContext::from_invoke(ActivityStub::new(handle.clone()), &invoke);
    let reply = match func(ctx).await {
        Ok(result) => ProxyReply::ok(ReplyBody::ActivityInvoke(ActivityInvokeReply { result })),
        Err(error) => ProxyReply::failed(
            ReplyBody::ActivityInvoke(ActivityInvokeReply::default()),
            error,
        ),
    };
    send_invoke_reply(&handle, correlation_id, reply).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use taskmux_core::messages::WorkflowContinueAsNewReply;
    use taskmux_core::{MessageType, TypeRegistry};
    use tokio::io::DuplexStream;
    use tokio_util::codec::Framed;

    use super::*;
    use crate::bridge::Bridge;
    use crate::codec::{FrameCodec, InboundFrame};
    use crate::config::BridgeConfig;

    /// Manual proxy side: drives invocations and inspects what the worker
    /// sends back.
    struct ProxyPeer {
        framed: Framed<DuplexStream, FrameCodec>,
    }

    impl ProxyPeer {
        fn new(peer: DuplexStream) -> Self {
            let registry = Arc::new(TypeRegistry::bridge_default());
            Self {
                framed: Framed::new(peer, FrameCodec::new(registry, 16 * 1024 * 1024)),
            }
        }

        async fn send(&mut self, envelope: Envelope) {
            self.framed.send(envelope).await.unwrap();
        }

        async fn recv(&mut self) -> Envelope {
            loop {
                match self.framed.next().await.unwrap().unwrap() {
                    InboundFrame::Envelope(envelope) => return envelope,
                    InboundFrame::Unknown { .. } => {}
                }
            }
        }
    }

    fn start_worker(registry: WorkerRegistry) -> (BridgeHandle, Worker, ProxyPeer) {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());
        let worker = Worker::spawn(handle.clone(), Arc::new(registry)).unwrap();
        (handle, worker, ProxyPeer::new(peer))
    }

    fn invoke_request() -> WorkflowInvokeRequest {
        WorkflowInvokeRequest {
            domain: Some("orders".to_string()),
            workflow_id: Some("order-1001".to_string()),
            run_id: Some("run-abc".to_string()),
            workflow_type: Some("ProcessOrder".to_string()),
            task_list: Some("fulfillment".to_string()),
            args: Some(b"hello".to_vec()),
            execution_start_to_close: Some(Duration::from_secs(3600)),
        }
    }

    #[tokio::test]
    async fn invoke_runs_registered_workflow_and_replies() {
        let registry = WorkerRegistry::new();
        registry.register_workflow("ProcessOrder", |ctx: WorkflowContext| async move {
            WorkflowOutcome::Completed(ctx.input().map(<[u8]>::to_vec))
        });
        let (_handle, _worker, mut peer) = start_worker(registry);

        peer.send(Envelope::request(
            501,
            ProxyRequest::WorkflowInvoke(invoke_request()),
        ))
        .await;

        let reply = peer.recv().await;
        assert_eq!(reply.correlation_id, 501);
        let ProxyMessage::Reply(reply) = reply.message else {
            panic!("expected reply");
        };
        assert_eq!(reply.error, None);
        let ReplyBody::WorkflowInvoke(body) = reply.body else {
            panic!("wrong body");
        };
        assert_eq!(body.result.as_deref(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn continuation_fills_unset_fields_from_current_execution() {
        crate::test_support::init_tracing();
        let registry = WorkerRegistry::new();
        registry.register_workflow("ProcessOrder", |_ctx| async move {
            WorkflowOutcome::ContinueAsNew(ContinuationSignal::with_input(
                b"restart-payload".to_vec(),
            ))
        });
        let (_handle, _worker, mut peer) = start_worker(registry);

        peer.send(Envelope::request(
            501,
            ProxyRequest::WorkflowInvoke(invoke_request()),
        ))
        .await;

        // First the hosting frame submits continue-as-new through the
        // correlation engine.
        let can = peer.recv().await;
        assert_eq!(can.message_type(), MessageType::WorkflowContinueAsNewRequest);
        assert_ne!(can.correlation_id, 0);
        let ProxyMessage::Request(ProxyRequest::WorkflowContinueAsNew(request)) = can.message
        else {
            panic!("expected continue-as-new request");
        };
        assert_eq!(request.args.as_deref(), Some(&b"restart-payload"[..]));
        // Unset overrides inherit the current execution's values.
        assert_eq!(request.domain.as_deref(), Some("orders"));
        assert_eq!(request.task_list.as_deref(), Some("fulfillment"));
        assert_eq!(
            request.execution_start_to_close,
            Some(Duration::from_secs(3600))
        );
        assert_eq!(request.workflow_id.as_deref(), Some("order-1001"));
        assert_eq!(request.run_id.as_deref(), Some("run-abc"));
        assert_eq!(request.schedule_to_start, None);
        assert_eq!(request.schedule_to_close, None);

        peer.send(Envelope::reply(
            can.correlation_id,
            ProxyReply::ok(ReplyBody::WorkflowContinueAsNew(WorkflowContinueAsNewReply)),
        ))
        .await;

        // Then the invocation completes normally, without surfacing the
        // signal as a failure.
        let reply = peer.recv().await;
        assert_eq!(reply.correlation_id, 501);
        let ProxyMessage::Reply(reply) = reply.message else {
            panic!("expected reply");
        };
        assert_eq!(reply.error, None);
        assert!(matches!(reply.body, ReplyBody::WorkflowInvoke(_)));
    }

    #[tokio::test]
    async fn continuation_overrides_beat_execution_defaults() {
        let registry = WorkerRegistry::new();
        registry.register_workflow("ProcessOrder", |_ctx| async move {
            WorkflowOutcome::ContinueAsNew(
                ContinuationSignal::with_input(b"x".to_vec())
                    .in_domain("overflow")
                    .with_execution_timeout(Duration::from_secs(60)),
            )
        });
        let (_handle, _worker, mut peer) = start_worker(registry);

        peer.send(Envelope::request(
            77,
            ProxyRequest::WorkflowInvoke(invoke_request()),
        ))
        .await;

        let can = peer.recv().await;
        let ProxyMessage::Request(ProxyRequest::WorkflowContinueAsNew(request)) = can.message
        else {
            panic!("expected continue-as-new request");
        };
        assert_eq!(request.domain.as_deref(), Some("overflow"));
        assert_eq!(
            request.execution_start_to_close,
            Some(Duration::from_secs(60))
        );
        // Unset override still inherited.
        assert_eq!(request.task_list.as_deref(), Some("fulfillment"));
    }

    #[tokio::test]
    async fn failed_continuation_request_fails_current_execution() {
        let registry = WorkerRegistry::new();
        registry.register_workflow("ProcessOrder", |_ctx| async move {
            WorkflowOutcome::ContinueAsNew(ContinuationSignal::with_input(b"x".to_vec()))
        });
        let (_handle, _worker, mut peer) = start_worker(registry);

        peer.send(Envelope::request(
            42,
            ProxyRequest::WorkflowInvoke(invoke_request()),
        ))
        .await;

        let can = peer.recv().await;
        peer.send(Envelope::reply(
            can.correlation_id,
            ProxyReply::failed(
                ReplyBody::WorkflowContinueAsNew(WorkflowContinueAsNewReply),
                RemoteError::new("DomainDeprecated", "orders"),
            ),
        ))
        .await;

        let reply = peer.recv().await;
        assert_eq!(reply.correlation_id, 42);
        let ProxyMessage::Reply(reply) = reply.message else {
            panic!("expected reply");
        };
        let error = reply.error.expect("fatal failure expected");
        assert_eq!(error.code, "ContinueAsNewFailed");
    }

    #[tokio::test]
    async fn unregistered_workflow_type_fails_back_to_engine() {
        let (_handle, _worker, mut peer) = start_worker(WorkerRegistry::new());

        peer.send(Envelope::request(
            8,
            ProxyRequest::WorkflowInvoke(invoke_request()),
        ))
        .await;

        let reply = peer.recv().await;
        let ProxyMessage::Reply(reply) = reply.message else {
            panic!("expected reply");
        };
        assert_eq!(reply.error.unwrap().code, "UnknownWorkflowType");
    }

    #[tokio::test]
    async fn activity_invoke_heartbeats_and_completes() {
        let registry = WorkerRegistry::new();
        registry.register_activity("ChargeCard", |ctx: ActivityContext| async move {
            ctx.record_heartbeat(Some(b"authorizing".to_vec())).await
                .map_err(|err| RemoteError::new("HeartbeatFailed", err.to_string()))?;
            Ok(Some(b"charged".to_vec()))
        });
        let (_handle, _worker, mut peer) = start_worker(registry);

        peer.send(Envelope::request(
            601,
            ProxyRequest::ActivityInvoke(ActivityInvokeRequest {
                activity_id: Some("act-1".to_string()),
                activity_type: Some("ChargeCard".to_string()),
                args: Some(b"{\"amount\":100}".to_vec()),
                task_token: Some(vec![0xAA]),
            }),
        ))
        .await;

        // The activity heartbeats mid-flight through the correlation
        // engine.
        let heartbeat = peer.recv().await;
        assert_eq!(
            heartbeat.message_type(),
            MessageType::ActivityRecordHeartbeatRequest
        );
        peer.send(Envelope::reply(
            heartbeat.correlation_id,
            ProxyReply::ok(ReplyBody::ActivityRecordHeartbeat(
                taskmux_core::messages::ActivityRecordHeartbeatReply,
            )),
        ))
        .await;

        let reply = peer.recv().await;
        assert_eq!(reply.correlation_id, 601);
        let ProxyMessage::Reply(reply) = reply.message else {
            panic!("expected reply");
        };
        assert_eq!(reply.error, None);
        let ReplyBody::ActivityInvoke(body) = reply.body else {
            panic!("wrong body");
        };
        assert_eq!(body.result.as_deref(), Some(&b"charged"[..]));
    }

    #[tokio::test]
    async fn second_worker_cannot_claim_inbound_stream() {
        let (io, _peer) = tokio::io::duplex(64 * 1024);
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());
        let first = Worker::spawn(handle.clone(), Arc::new(WorkerRegistry::new())).unwrap();
        assert!(Worker::spawn(handle, Arc::new(WorkerRegistry::new())).is_err());
        first.abort();
    }
}
