//! Framed transport loops over the duplex proxy channel.
//!
//! One read loop and one write loop per bridge. The read loop classifies
//! every decoded frame: replies go to the correlation table, requests are
//! forwarded to the worker dispatch channel, and unknown discriminators
//! fail only the operation they correlate with. Transport-fatal conditions
//! (malformed frame, i/o error, peer close) cancel everything in flight
//! and signal shutdown before the loops exit.

use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::{SinkExt, StreamExt};
use taskmux_core::{BridgeError, Envelope, ProxyMessage};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::bridge::BridgeState;
use crate::codec::{FrameCodec, InboundFrame};
use crate::correlation::CorrelationTable;

/// Handles to the spawned i/o loops, held by the bridge for teardown.
#[derive(Debug)]
pub(crate) struct TransportTasks {
    pub read: JoinHandle<()>,
    pub write: JoinHandle<()>,
}

/// Splits the duplex stream and spawns the read/write loops.
pub(crate) fn spawn<T>(
    io: T,
    codec: FrameCodec,
    table: Arc<CorrelationTable>,
    state: Arc<ArcSwap<BridgeState>>,
    inbound_tx: mpsc::Sender<Envelope>,
    outbound_rx: mpsc::Receiver<Envelope>,
    shutdown_tx: watch::Sender<bool>,
) -> TransportTasks
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(io);
    let framed_read = FramedRead::new(read_half, codec.clone());
    let framed_write = FramedWrite::new(write_half, codec);

    let read = tokio::spawn(read_loop(
        framed_read,
        table,
        state,
        inbound_tx,
        shutdown_tx.clone(),
    ));
    let write = tokio::spawn(write_loop(framed_write, outbound_rx, shutdown_tx));

    TransportTasks { read, write }
}

async fn read_loop<R>(
    mut framed: FramedRead<R, FrameCodec>,
    table: Arc<CorrelationTable>,
    state: Arc<ArcSwap<BridgeState>>,
    inbound_tx: mpsc::Sender<Envelope>,
    shutdown_tx: watch::Sender<bool>,
) where
    R: AsyncRead + Unpin,
{
    let mut shutdown_rx = shutdown_tx.subscribe();
    if *shutdown_rx.borrow_and_update() {
        return;
    }
    let teardown_reason = loop {
        tokio::select! {
            frame = framed.next() => match frame {
                Some(Ok(InboundFrame::Envelope(envelope))) => {
                    dispatch_inbound(envelope, &table, &inbound_tx).await;
                }
                Some(Ok(InboundFrame::Unknown { discriminator, correlation_id })) => {
                    tracing::warn!(discriminator, correlation_id, "unknown message type");
                    if correlation_id != 0 {
                        table.fail(
                            correlation_id,
                            BridgeError::UnknownMessageType { discriminator },
                        );
                    }
                }
                Some(Err(err)) => {
                    tracing::error!(%err, "transport read failed");
                    break "transport failure";
                }
                None => {
                    tracing::info!("proxy closed the channel");
                    break "proxy disconnected";
                }
            },
            _ = shutdown_rx.changed() => return,
        }
    };

    // Transport-fatal path: nothing further can resolve, so release every
    // waiting caller before the loop exits.
    state.store(Arc::new(BridgeState::Stopped));
    table.cancel_all(teardown_reason);
    let _ = shutdown_tx.send(true);
}

async fn dispatch_inbound(
    envelope: Envelope,
    table: &CorrelationTable,
    inbound_tx: &mpsc::Sender<Envelope>,
) {
    match envelope.message {
        ProxyMessage::Reply(reply) => {
            table.resolve_reply(envelope.correlation_id, reply);
        }
        ProxyMessage::Request(request) => {
            let correlation_id = envelope.correlation_id;
            let message_type = request.message_type();
            if inbound_tx
                .send(Envelope::request(correlation_id, request))
                .await
                .is_err()
            {
                tracing::warn!(
                    correlation_id,
                    ?message_type,
                    "dropping inbound request, dispatcher gone"
                );
            }
        }
    }
}

async fn write_loop<W>(
    mut framed: FramedWrite<W, FrameCodec>,
    mut outbound_rx: mpsc::Receiver<Envelope>,
    shutdown_tx: watch::Sender<bool>,
) where
    W: AsyncWrite + Unpin,
{
    let mut shutdown_rx = shutdown_tx.subscribe();
    if *shutdown_rx.borrow_and_update() {
        return;
    }
    loop {
        tokio::select! {
            item = outbound_rx.recv() => match item {
                Some(envelope) => {
                    if let Err(err) = framed.send(envelope).await {
                        tracing::error!(%err, "transport write failed");
                        let _ = shutdown_tx.send(true);
                        return;
                    }
                }
                None => return,
            },
            _ = shutdown_rx.changed() => {
                // Flush whatever was already accepted before exiting.
                let _ = framed.flush().await;
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
