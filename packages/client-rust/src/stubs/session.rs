//! Session stub: handshake, liveness, and pending-operation cancellation.

use taskmux_core::messages::{ConnectRequest, InitializeRequest};
use taskmux_core::{BridgeError, ProxyRequest, ReplyBody};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

/// Typed stub for session-level proxy operations.
#[derive(Clone)]
pub struct SessionStub {
    handle: BridgeHandle,
}

impl SessionStub {
    #[must_use]
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }

    /// Tells the proxy where the host listens for proxy-driven messages.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn initialize(&self, listen_address: Option<String>) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::Initialize(InitializeRequest { listen_address }))
            .await?;
        match reply.body {
            ReplyBody::Initialize(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Connects the proxy to the orchestration-engine cluster.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`]; `Remote` when the engine
    /// rejects the connection.
    pub async fn connect(&self, options: ConnectRequest) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::Connect(options))
            .await?;
        match reply.body {
            ReplyBody::Connect(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Asks the proxy to shut down gracefully.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn terminate(&self) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::Terminate(
                taskmux_core::messages::TerminateRequest,
            ))
            .await?;
        match reply.body {
            ReplyBody::Terminate(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// One liveness probe round trip.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn heartbeat(&self) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::Heartbeat(
                taskmux_core::messages::HeartbeatRequest,
            ))
            .await?;
        match reply.body {
            ReplyBody::Heartbeat(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Raw throughput probe; the proxy answers immediately.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn ping(&self) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::Ping(taskmux_core::messages::PingRequest))
            .await?;
        match reply.body {
            ReplyBody::Ping(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Asks the proxy to cancel a still-pending operation. Returns whether
    /// the target was actually cancelled, as opposed to having already
    /// resolved. A confirmed cancellation also releases the local caller.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn cancel(&self, target_request_id: u64) -> Result<bool, BridgeError> {
        self.handle.cancel_operation(target_request_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use taskmux_core::{Envelope, ProxyMessage, TypeRegistry};

    use super::*;
    use crate::bridge::Bridge;
    use crate::config::BridgeConfig;
    use crate::test_support::{default_reply, ScriptedProxy};

    fn echo(envelope: &Envelope) -> Vec<Envelope> {
        let ProxyMessage::Request(request) = &envelope.message else {
            return Vec::new();
        };
        vec![Envelope::reply(
            envelope.correlation_id,
            default_reply(request),
        )]
    }

    fn start_stub() -> (SessionStub, ScriptedProxy) {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let proxy = ScriptedProxy::spawn(peer, echo);
        let stub = SessionStub::new(Bridge::start(
            io,
            TypeRegistry::bridge_default(),
            BridgeConfig::default(),
        ));
        (stub, proxy)
    }

    #[tokio::test]
    async fn lifecycle_calls_round_trip() {
        let (stub, _proxy) = start_stub();
        stub.initialize(Some("127.0.0.1:9099".to_string()))
            .await
            .unwrap();
        stub.connect(taskmux_core::messages::ConnectRequest {
            endpoints: Some("engine:7933".to_string()),
            domain: Some("orders".to_string()),
            client_timeout: Duration::from_secs(10),
            ..taskmux_core::messages::ConnectRequest::default()
        })
        .await
        .unwrap();
        stub.heartbeat().await.unwrap();
        stub.ping().await.unwrap();
        stub.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_reports_proxy_decision() {
        let (stub, _proxy) = start_stub();
        assert!(stub.cancel(1234).await.unwrap());
    }
}
