//! Shared test harness: a scripted in-process stand-in for the proxy,
//! speaking real frames over a duplex pipe.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use taskmux_core::messages::{
    ActivityCompleteReply, ActivityGetHeartbeatDetailsReply, ActivityInvokeReply,
    ActivityRecordHeartbeatReply, CancelReply, ConnectReply, DomainDeprecateReply,
    DomainDescribeReply, DomainRegisterReply, DomainUpdateReply, HeartbeatReply, InitializeReply,
    NewWorkerReply, PingReply, StopWorkerReply, TerminateReply, WorkflowContinueAsNewReply,
    WorkflowExecuteReply, WorkflowGetResultReply, WorkflowInvokeReply, WorkflowQueryReply,
    WorkflowSignalReply,
};
use taskmux_core::{
    Envelope, MessageType, ProxyReply, ProxyRequest, ReplyBody, TypeRegistry, WorkflowExecution,
};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::codec::{FrameCodec, InboundFrame};

/// Installs a compact log subscriber for test debugging, honoring
/// `RUST_LOG`. Safe to call from every test; only the first call wins.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fake proxy process: decodes inbound frames, hands each envelope to the
/// script, and writes back whatever envelopes the script returns.
pub(crate) struct ScriptedProxy {
    handle: JoinHandle<()>,
}

impl ScriptedProxy {
    pub(crate) fn spawn<F>(peer: DuplexStream, mut script: F) -> Self
    where
        F: FnMut(&Envelope) -> Vec<Envelope> + Send + 'static,
    {
        let registry = Arc::new(TypeRegistry::bridge_default());
        let mut framed = Framed::new(peer, FrameCodec::new(registry, 16 * 1024 * 1024));
        let handle = tokio::spawn(async move {
            while let Some(frame) = framed.next().await {
                match frame {
                    Ok(InboundFrame::Envelope(envelope)) => {
                        for response in script(&envelope) {
                            if framed.send(response).await.is_err() {
                                return;
                            }
                        }
                    }
                    Ok(InboundFrame::Unknown { .. }) => {}
                    Err(_) => return,
                }
            }
        });
        Self { handle }
    }
}

impl Drop for ScriptedProxy {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A well-formed success reply for any client request, with neutral field
/// values. Tests needing specific fields build replies themselves.
pub(crate) fn default_reply(request: &ProxyRequest) -> ProxyReply {
    let body = match request {
        ProxyRequest::Initialize(_) => ReplyBody::Initialize(InitializeReply),
        ProxyRequest::Connect(_) => ReplyBody::Connect(ConnectReply),
        ProxyRequest::Terminate(_) => ReplyBody::Terminate(TerminateReply),
        ProxyRequest::Heartbeat(_) => ReplyBody::Heartbeat(HeartbeatReply),
        ProxyRequest::Ping(_) => ReplyBody::Ping(PingReply),
        ProxyRequest::Cancel(_) => ReplyBody::Cancel(CancelReply {
            was_cancelled: true,
        }),
        ProxyRequest::DomainRegister(_) => ReplyBody::DomainRegister(DomainRegisterReply),
        ProxyRequest::DomainDescribe(_) => {
            ReplyBody::DomainDescribe(DomainDescribeReply::default())
        }
        ProxyRequest::DomainUpdate(_) => ReplyBody::DomainUpdate(DomainUpdateReply),
        ProxyRequest::DomainDeprecate(_) => ReplyBody::DomainDeprecate(DomainDeprecateReply),
        ProxyRequest::NewWorker(_) => ReplyBody::NewWorker(NewWorkerReply { worker_id: 1 }),
        ProxyRequest::StopWorker(_) => ReplyBody::StopWorker(StopWorkerReply),
        ProxyRequest::WorkflowExecute(req) => ReplyBody::WorkflowExecute(WorkflowExecuteReply {
            execution: Some(WorkflowExecution {
                workflow_id: req
                    .workflow_id
                    .clone()
                    .unwrap_or_else(|| "generated-id".to_string()),
                run_id: "run-1".to_string(),
            }),
        }),
        ProxyRequest::WorkflowSignal(_) => ReplyBody::WorkflowSignal(WorkflowSignalReply),
        ProxyRequest::WorkflowQuery(_) => {
            ReplyBody::WorkflowQuery(WorkflowQueryReply::default())
        }
        ProxyRequest::WorkflowGetResult(_) => {
            ReplyBody::WorkflowGetResult(WorkflowGetResultReply::default())
        }
        ProxyRequest::WorkflowContinueAsNew(_) => {
            ReplyBody::WorkflowContinueAsNew(WorkflowContinueAsNewReply)
        }
        ProxyRequest::WorkflowInvoke(_) => {
            ReplyBody::WorkflowInvoke(WorkflowInvokeReply::default())
        }
        ProxyRequest::ActivityInvoke(_) => {
            ReplyBody::ActivityInvoke(ActivityInvokeReply::default())
        }
        ProxyRequest::ActivityRecordHeartbeat(_) => {
            ReplyBody::ActivityRecordHeartbeat(ActivityRecordHeartbeatReply)
        }
        ProxyRequest::ActivityGetHeartbeatDetails(_) => {
            ReplyBody::ActivityGetHeartbeatDetails(ActivityGetHeartbeatDetailsReply::default())
        }
        ProxyRequest::ActivityComplete(_) => ReplyBody::ActivityComplete(ActivityCompleteReply),
    };
    ProxyReply::ok(body)
}

/// A reply the client-side registry built by [`registry_without_poison`]
/// cannot decode, for exercising unknown-discriminator handling end to end.
pub(crate) fn poison_reply() -> ProxyReply {
    ProxyReply::ok(ReplyBody::StopWorker(StopWorkerReply))
}

/// The full registry minus the [`poison_reply`] discriminator.
pub(crate) fn registry_without_poison() -> TypeRegistry {
    let mut registry = TypeRegistry::empty();
    for mt in MessageType::ALL {
        if mt != MessageType::StopWorkerReply {
            registry.register(mt);
        }
    }
    registry
}
