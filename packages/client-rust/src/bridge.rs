//! Bridge lifecycle: wiring the transport, correlation table, and expiry
//! sweep together behind one cloneable handle.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use taskmux_core::{
    BridgeError, Envelope, ProxyReply, ProxyRequest, TypeRegistry,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::codec::FrameCodec;
use crate::config::BridgeConfig;
use crate::correlation::CorrelationTable;
use crate::transport;

/// Bridge lifecycle state.
///
/// State machine: Running -> Draining -> Stopped. Transport failure jumps
/// straight to Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Accepting submissions.
    Running,
    /// Shutdown requested; no new submissions, pending operations being
    /// cancelled.
    Draining,
    /// Transport torn down; nothing pending.
    Stopped,
}

/// Entry point: starts a bridge over an established duplex channel to the
/// proxy process.
pub struct Bridge;

impl Bridge {
    /// Spawns the transport loops and the expiry sweep, returning the
    /// handle user-facing stubs are built from.
    ///
    /// The registry is assembled by the caller before any traffic flows and
    /// is read-only afterwards. Configuration comes from the host;
    /// the bridge takes it as a value and never consults the environment.
    pub fn start<T>(io: T, registry: TypeRegistry, config: BridgeConfig) -> BridgeHandle
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let registry = Arc::new(registry);
        let codec = FrameCodec::new(registry.clone(), config.max_frame_len);
        let table = Arc::new(CorrelationTable::new());
        let state = Arc::new(ArcSwap::from_pointee(BridgeState::Running));
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_channel_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_channel_capacity);
        let (shutdown_tx, _) = watch::channel(false);

        let tasks = transport::spawn(
            io,
            codec,
            table.clone(),
            state.clone(),
            inbound_tx,
            outbound_rx,
            shutdown_tx.clone(),
        );

        let sweep = tokio::spawn(sweep_loop(
            table.clone(),
            config.sweep_interval,
            shutdown_tx.subscribe(),
        ));

        BridgeHandle {
            shared: Arc::new(BridgeShared {
                table,
                state,
                outbound: outbound_tx,
                inbound: parking_lot::Mutex::new(Some(inbound_rx)),
                shutdown: shutdown_tx,
                config,
                _tasks: tasks,
                _sweep: sweep,
            }),
        }
    }
}

/// Periodic deadline sweep: one timer serves every pending operation.
async fn sweep_loop(
    table: Arc<CorrelationTable>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(interval);
    // Skip the immediate first tick.
    tick.tick().await;
    loop {
        tokio::select! {
            _ = tick.tick() => {
                table.sweep_expired(Instant::now());
            }
            _ = shutdown_rx.changed() => return,
        }
    }
}

struct BridgeShared {
    table: Arc<CorrelationTable>,
    state: Arc<ArcSwap<BridgeState>>,
    outbound: mpsc::Sender<Envelope>,
    inbound: parking_lot::Mutex<Option<mpsc::Receiver<Envelope>>>,
    shutdown: watch::Sender<bool>,
    config: BridgeConfig,
    _tasks: transport::TransportTasks,
    _sweep: tokio::task::JoinHandle<()>,
}

/// Cloneable handle to a running bridge.
///
/// Stubs and workers hold clones; the bridge stays up until
/// [`BridgeHandle::shutdown`] or a transport-fatal error.
#[derive(Clone)]
pub struct BridgeHandle {
    shared: Arc<BridgeShared>,
}

impl BridgeHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        **self.shared.state.load()
    }

    /// Number of operations currently awaiting replies.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.shared.table.len()
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Submits a request with the configured default timeout.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`]; see [`Self::submit_with_timeout`].
    pub async fn submit(&self, request: ProxyRequest) -> Result<ProxyReply, BridgeError> {
        self.submit_with_timeout(request, self.shared.config.default_operation_timeout)
            .await
    }

    /// Submits a request and suspends until its reply, timeout, or
    /// cancellation.
    ///
    /// Correlation id allocation and transport hand-off happen in one
    /// step: a request that cannot be handed off releases its pending slot
    /// immediately instead of leaking it.
    ///
    /// # Errors
    ///
    /// `Timeout` when the deadline passes first, `Cancelled` on shutdown or
    /// disconnect, `ProtocolError` on a mismatched reply variant, and
    /// `Remote` when the proxy reports the operation failed.
    pub async fn submit_with_timeout(
        &self,
        request: ProxyRequest,
        timeout: Duration,
    ) -> Result<ProxyReply, BridgeError> {
        if self.state() != BridgeState::Running {
            return Err(BridgeError::cancelled("bridge is not running"));
        }

        let (correlation_id, rx) = self.shared.table.register(&request, timeout);
        let envelope = Envelope::request(correlation_id, request);
        if self.shared.outbound.send(envelope).await.is_err() {
            self.shared.table.abandon(correlation_id);
            return Err(BridgeError::cancelled("transport closed"));
        }

        match rx.await {
            Ok(resolution) => resolution,
            // Resolution slot dropped without a send: the table was torn
            // down mid-flight.
            Err(_) => Err(BridgeError::cancelled("bridge shut down")),
        }
    }

    /// Asks the proxy to cancel a still-pending operation. When the proxy
    /// confirms, the local pending slot resolves as `Cancelled` too, so
    /// its caller is released immediately instead of waiting out the
    /// deadline. Returns the proxy's decision.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`] from the cancel call itself.
    pub async fn cancel_operation(&self, target: u64) -> Result<bool, BridgeError> {
        let reply = self
            .submit(ProxyRequest::Cancel(
                taskmux_core::messages::CancelRequest {
                    target_request_id: target,
                },
            ))
            .await?;
        let was_cancelled = match reply.body {
            taskmux_core::ReplyBody::Cancel(cancel) => cancel.was_cancelled,
            _ => {
                return Err(BridgeError::ProtocolError {
                    detail: format!("unexpected reply variant {:?}", reply.message_type()),
                })
            }
        };
        if was_cancelled {
            self.shared
                .table
                .fail(target, BridgeError::cancelled("cancelled by caller"));
        }
        Ok(was_cancelled)
    }

    /// Sends a reply for a proxy-driven request, echoing the proxy's
    /// correlation id. Used by the worker hosting frames.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the transport has already closed.
    pub async fn send_reply(
        &self,
        correlation_id: u64,
        reply: ProxyReply,
    ) -> Result<(), BridgeError> {
        self.shared
            .outbound
            .send(Envelope::reply(correlation_id, reply))
            .await
            .map_err(|_| BridgeError::cancelled("transport closed"))
    }

    /// Takes the inbound invocation stream. The first caller (the worker
    /// dispatcher) gets it; later calls return `None`.
    #[must_use]
    pub fn take_inbound(&self) -> Option<mpsc::Receiver<Envelope>> {
        self.shared.inbound.lock().take()
    }

    /// Initiates shutdown: stops accepting submissions, cancels every
    /// pending operation in one sweep, and signals the transport loops.
    /// Idempotent.
    pub fn shutdown(&self) {
        let previous = self.shared.state.swap(Arc::new(BridgeState::Draining));
        if *previous == BridgeState::Stopped {
            self.shared.state.store(Arc::new(BridgeState::Stopped));
            return;
        }
        let _ = self.shared.shutdown.send(true);
        self.shared.table.cancel_all("bridge shutdown");
        self.shared.state.store(Arc::new(BridgeState::Stopped));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use taskmux_core::messages::{
        PingRequest, StopWorkerReply, StopWorkerRequest,
    };
    use taskmux_core::{ProxyMessage, ReplyBody};

    use super::*;
    use crate::test_support::ScriptedProxy;

    fn echo_proxy(envelope: &Envelope) -> Vec<Envelope> {
        let ProxyMessage::Request(request) = &envelope.message else {
            return Vec::new();
        };
        let reply = crate::test_support::default_reply(request);
        vec![Envelope::reply(envelope.correlation_id, reply)]
    }

    #[tokio::test]
    async fn stop_worker_round_trip() {
        crate::test_support::init_tracing();
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, echo_proxy);
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());

        let reply = handle
            .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id: 42 }))
            .await
            .unwrap();
        assert!(matches!(reply.body, ReplyBody::StopWorker(StopWorkerReply)));
        assert_eq!(handle.pending_operations(), 0);
    }

    #[tokio::test]
    async fn concurrent_submissions_resolve_independently() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, echo_proxy);
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());

        let mut joins = Vec::new();
        for worker_id in 0..16i64 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                handle
                    .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id }))
                    .await
            }));
        }
        for join in joins {
            assert!(join.await.unwrap().is_ok());
        }
        assert_eq!(handle.pending_operations(), 0);
    }

    #[tokio::test]
    async fn silent_proxy_times_out_via_sweep() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        // Proxy that swallows everything.
        let _proxy = ScriptedProxy::spawn(peer, |_| Vec::new());
        let config = BridgeConfig {
            sweep_interval: Duration::from_millis(20),
            ..BridgeConfig::default()
        };
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), config);

        let err = handle
            .submit_with_timeout(
                ProxyRequest::Ping(PingRequest),
                Duration::from_millis(40),
            )
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::Timeout { timeout_ms: 40 });
        assert_eq!(handle.pending_operations(), 0);
    }

    #[tokio::test]
    async fn shutdown_cancels_all_outstanding() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, |_| Vec::new());
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());

        let mut joins = Vec::new();
        for worker_id in 0..5i64 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                handle
                    .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id }))
                    .await
            }));
        }
        // Let the submissions register before tearing down.
        while handle.pending_operations() < 5 {
            tokio::task::yield_now().await;
        }

        handle.shutdown();
        for join in joins {
            let err = join.await.unwrap().unwrap_err();
            assert!(matches!(err, BridgeError::Cancelled { .. }), "{err}");
        }
        assert_eq!(handle.state(), BridgeState::Stopped);

        // Submissions after shutdown are rejected immediately.
        let err = handle.submit(ProxyRequest::Ping(PingRequest)).await.unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn cancel_releases_local_target_operation() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        // Proxy that answers cancels and swallows everything else.
        let _proxy = ScriptedProxy::spawn(peer, |envelope: &Envelope| {
            let ProxyMessage::Request(request) = &envelope.message else {
                return Vec::new();
            };
            match request {
                ProxyRequest::Cancel(_) => vec![Envelope::reply(
                    envelope.correlation_id,
                    crate::test_support::default_reply(request),
                )],
                _ => Vec::new(),
            }
        });
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());

        let submitter = handle.clone();
        let pending = tokio::spawn(async move {
            submitter
                .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id: 7 }))
                .await
        });
        while handle.pending_operations() < 1 {
            tokio::task::yield_now().await;
        }

        // Ids start at 1; the stop-worker above holds the first slot.
        assert!(handle.cancel_operation(1).await.unwrap());
        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled { .. }), "{err}");
        assert_eq!(handle.pending_operations(), 0);
    }

    #[tokio::test]
    async fn unknown_frame_fails_one_operation_keeps_transport() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, |envelope: &Envelope| {
            let ProxyMessage::Request(request) = &envelope.message else {
                return Vec::new();
            };
            match request {
                // Answer the stop-worker with a mangled discriminator the
                // client cannot decode; answer everything else normally.
                ProxyRequest::StopWorker(_) => {
                    vec![Envelope::reply(
                        envelope.correlation_id,
                        crate::test_support::poison_reply(),
                    )]
                }
                _ => vec![Envelope::reply(
                    envelope.correlation_id,
                    crate::test_support::default_reply(request),
                )],
            }
        });

        let registry = crate::test_support::registry_without_poison();
        let handle = Bridge::start(io, registry, BridgeConfig::default());

        let err = handle
            .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id: 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownMessageType { .. }), "{err}");

        // The transport stays open: a subsequent ping round-trips fine.
        let reply = handle.submit(ProxyRequest::Ping(PingRequest)).await.unwrap();
        assert!(matches!(reply.body, ReplyBody::Ping(_)));
    }

    #[tokio::test]
    async fn mismatched_reply_variant_is_protocol_error() {
        let (io, peer) = tokio::io::duplex(64 * 1024);
        let _proxy = ScriptedProxy::spawn(peer, |envelope: &Envelope| {
            vec![Envelope::reply(
                envelope.correlation_id,
                taskmux_core::ProxyReply::ok(ReplyBody::Ping(taskmux_core::messages::PingReply)),
            )]
        });
        let handle = Bridge::start(io, TypeRegistry::bridge_default(), BridgeConfig::default());

        let err = handle
            .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id: 3 }))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolError { .. }), "{err}");
    }
}
