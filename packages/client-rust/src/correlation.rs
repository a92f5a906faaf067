//! Pending-operation table: correlates asynchronous replies back to their
//! originating requests.
//!
//! Each submitted request registers an entry holding the expected reply
//! variant, a deadline, and a single-resolution completion slot. An entry
//! resolves exactly once, by reply, timeout, or shutdown; whichever path
//! removes the entry from the table first wins, and later attempts find
//! nothing and drop their result. Correlation ids come from an atomic
//! counter starting at 1 and are never reused within the process lifetime.
//!
//! Uses `DashMap` so reply lookup, registration, and the expiry sweep never
//! block each other on one global lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use taskmux_core::{BridgeError, MessageType, ProxyReply, ProxyRequest};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Completion slot type: a pending operation resolves to a reply or a
/// bridge error, exactly once.
pub(crate) type Resolution = Result<ProxyReply, BridgeError>;

/// One tracked operation.
#[derive(Debug)]
struct PendingEntry {
    /// Discriminator of the request, kept for log context.
    request_type: MessageType,
    /// Reply variant this operation's request statically expects.
    expected_reply: MessageType,
    /// Absolute expiry, set at registration from the caller's timeout.
    deadline: Instant,
    /// Original timeout, reported inside the timeout error.
    timeout: Duration,
    tx: oneshot::Sender<Resolution>,
}

/// Table of in-flight operations keyed by correlation id.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: DashMap<u64, PendingEntry>,
    next_id: AtomicU64,
}

impl CorrelationTable {
    /// Creates an empty table. Correlation ids start at 1; 0 is the wire
    /// sentinel for "uncorrelated".
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of operations currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Allocates a fresh correlation id and registers a pending entry for
    /// the request. The caller must hand the request to the transport in
    /// the same critical step; if that hand-off fails, [`Self::abandon`]
    /// reclaims the slot so it cannot leak.
    pub(crate) fn register(
        &self,
        request: &ProxyRequest,
        timeout: Duration,
    ) -> (u64, oneshot::Receiver<Resolution>) {
        let correlation_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let entry = PendingEntry {
            request_type: request.message_type(),
            expected_reply: request.reply_type(),
            deadline: Instant::now() + timeout,
            timeout,
            tx,
        };
        self.pending.insert(correlation_id, entry);
        tracing::debug!(
            correlation_id,
            request = ?request.message_type(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "operation submitted"
        );
        (correlation_id, rx)
    }

    /// Removes a slot whose request never reached the transport.
    pub(crate) fn abandon(&self, correlation_id: u64) {
        self.pending.remove(&correlation_id);
    }

    /// Routes an inbound reply to its pending operation.
    ///
    /// No table match means the operation already resolved (usually by
    /// timeout) or the proxy is racing a restart: the reply is dropped at
    /// debug level, never treated as fatal. A variant mismatch against the
    /// statically expected reply resolves the operation as a protocol
    /// error.
    pub fn resolve_reply(&self, correlation_id: u64, reply: ProxyReply) {
        let Some((_, entry)) = self.pending.remove(&correlation_id) else {
            tracing::debug!(
                correlation_id,
                reply = ?reply.message_type(),
                "dropping reply with no pending operation"
            );
            return;
        };

        let actual = reply.message_type();
        let resolution = if actual != entry.expected_reply {
            tracing::warn!(
                correlation_id,
                request = ?entry.request_type,
                expected = ?entry.expected_reply,
                ?actual,
                "reply variant mismatch"
            );
            Err(BridgeError::ProtocolError {
                detail: format!(
                    "expected {:?} for {:?}, got {actual:?}",
                    entry.expected_reply, entry.request_type
                ),
            })
        } else if let Some(remote) = reply.error {
            Err(BridgeError::Remote(remote))
        } else {
            Ok(reply)
        };

        entry.deliver(correlation_id, resolution);
    }

    /// Resolves one operation as failed. Returns `false` when the id is no
    /// longer pending (already resolved; the failure is dropped).
    pub fn fail(&self, correlation_id: u64, error: BridgeError) -> bool {
        match self.pending.remove(&correlation_id) {
            Some((_, entry)) => {
                entry.deliver(correlation_id, Err(error));
                true
            }
            None => {
                tracing::debug!(correlation_id, %error, "failure for already-resolved operation");
                false
            }
        }
    }

    /// Resolves every operation whose deadline has passed as timed out.
    /// Called from the single periodic sweep task. Returns how many
    /// operations expired.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|entry| entry.value().deadline <= now)
            .map(|entry| *entry.key())
            .collect();

        let mut resolved = 0;
        for correlation_id in expired {
            // remove() may lose the race against a concurrently arriving
            // reply; first resolution wins either way.
            if let Some((_, entry)) = self.pending.remove(&correlation_id) {
                let timeout_ms = u64::try_from(entry.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::debug!(
                    correlation_id,
                    request = ?entry.request_type,
                    timeout_ms,
                    "operation timed out"
                );
                entry.deliver(correlation_id, Err(BridgeError::Timeout { timeout_ms }));
                resolved += 1;
            }
        }
        resolved
    }

    /// Resolves every outstanding operation as cancelled in one sweep, so
    /// no caller is left waiting across shutdown or proxy disconnect.
    /// Idempotent with the expiry sweep: both may race for the same entry
    /// and only the first removal wins.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut resolved = 0;
        for correlation_id in ids {
            if let Some((_, entry)) = self.pending.remove(&correlation_id) {
                entry.deliver(correlation_id, Err(BridgeError::cancelled(reason)));
                resolved += 1;
            }
        }
        if resolved > 0 {
            tracing::info!(count = resolved, reason, "cancelled pending operations");
        }
        resolved
    }
}

impl PendingEntry {
    fn deliver(self, correlation_id: u64, resolution: Resolution) {
        let outcome = match &resolution {
            Ok(_) => "reply",
            Err(err) => err.as_log_label(),
        };
        tracing::debug!(correlation_id, outcome, "operation resolved");
        if self.tx.send(resolution).is_err() {
            // Receiver side gave up (caller dropped the future).
            tracing::debug!(correlation_id, "resolution discarded, caller gone");
        }
    }
}

trait LogLabel {
    fn as_log_label(&self) -> &'static str;
}

impl LogLabel for BridgeError {
    fn as_log_label(&self) -> &'static str {
        match self {
            BridgeError::MalformedPayload { .. } => "malformed",
            BridgeError::UnknownMessageType { .. } => "unknown-type",
            BridgeError::ProtocolError { .. } => "protocol-error",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::Cancelled { .. } => "cancelled",
            BridgeError::Remote(_) => "remote-failure",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use taskmux_core::messages::{PingReply, PingRequest, StopWorkerReply, StopWorkerRequest};
    use taskmux_core::{RemoteError, ReplyBody};

    use super::*;

    fn stop_worker() -> ProxyRequest {
        ProxyRequest::StopWorker(StopWorkerRequest { worker_id: 42 })
    }

    fn stop_worker_reply() -> ProxyReply {
        ProxyReply::ok(ReplyBody::StopWorker(StopWorkerReply))
    }

    #[tokio::test]
    async fn ids_are_fresh_and_start_at_one() {
        let table = CorrelationTable::new();
        let (id1, _rx1) = table.register(&stop_worker(), Duration::from_secs(1));
        let (id2, _rx2) = table.register(&stop_worker(), Duration::from_secs(1));
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn reply_resolves_matching_operation() {
        let table = CorrelationTable::new();
        let (id, rx) = table.register(&stop_worker(), Duration::from_secs(1));

        table.resolve_reply(id, stop_worker_reply());
        let resolution = rx.await.unwrap();
        assert_eq!(resolution.unwrap().message_type(), MessageType::StopWorkerReply);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn out_of_order_replies_match_one_to_one() {
        let table = CorrelationTable::new();
        let mut waiting = Vec::new();
        for worker_id in 0..8i64 {
            let request = ProxyRequest::StopWorker(StopWorkerRequest { worker_id });
            let (id, rx) = table.register(&request, Duration::from_secs(5));
            waiting.push((id, worker_id, rx));
        }

        // Deliver replies in reverse submission order.
        for (id, _, _) in waiting.iter().rev() {
            table.resolve_reply(
                *id,
                ProxyReply::ok(ReplyBody::StopWorker(StopWorkerReply)),
            );
        }

        for (_, _, rx) in waiting {
            assert!(rx.await.unwrap().is_ok());
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn variant_mismatch_resolves_as_protocol_error() {
        let table = CorrelationTable::new();
        let (id, rx) = table.register(&stop_worker(), Duration::from_secs(1));

        table.resolve_reply(id, ProxyReply::ok(ReplyBody::Ping(PingReply)));
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolError { .. }), "{err}");
    }

    #[tokio::test]
    async fn remote_error_resolves_as_remote_failure() {
        let table = CorrelationTable::new();
        let (id, rx) = table.register(&stop_worker(), Duration::from_secs(1));

        table.resolve_reply(
            id,
            ProxyReply::failed(
                ReplyBody::StopWorker(StopWorkerReply),
                RemoteError::new("EntityNotExists", "no such worker"),
            ),
        );
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            BridgeError::Remote(RemoteError::new("EntityNotExists", "no such worker"))
        );
    }

    #[tokio::test]
    async fn unmatched_reply_is_dropped() {
        let table = CorrelationTable::new();
        // Nothing pending: must not panic or grow the table.
        table.resolve_reply(999, stop_worker_reply());
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_operations_time_out_via_sweep() {
        let table = CorrelationTable::new();
        let (_, rx_short) = table.register(&stop_worker(), Duration::from_millis(50));
        let (_, rx_long) = table.register(&stop_worker(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_millis(100)).await;
        let expired = table.sweep_expired(Instant::now());
        assert_eq!(expired, 1);

        let err = rx_short.await.unwrap().unwrap_err();
        assert_eq!(err, BridgeError::Timeout { timeout_ms: 50 });
        assert_eq!(table.len(), 1);
        drop(rx_long);
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_after_timeout_is_dropped() {
        let table = CorrelationTable::new();
        let (id, rx) = table.register(&stop_worker(), Duration::from_millis(10));

        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(table.sweep_expired(Instant::now()), 1);
        assert!(matches!(
            rx.await.unwrap().unwrap_err(),
            BridgeError::Timeout { .. }
        ));

        // The reply arrives after resolution: dropped, no re-resolution.
        table.resolve_reply(id, stop_worker_reply());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn cancel_all_resolves_every_outstanding_operation() {
        let table = CorrelationTable::new();
        let receivers: Vec<_> = (0..5)
            .map(|_| table.register(&stop_worker(), Duration::from_secs(60)).1)
            .collect();

        assert_eq!(table.cancel_all("proxy disconnected"), 5);
        assert!(table.is_empty());

        for rx in receivers {
            let err = rx.await.unwrap().unwrap_err();
            assert_eq!(err, BridgeError::cancelled("proxy disconnected"));
        }

        // Idempotent: a second sweep finds nothing.
        assert_eq!(table.cancel_all("proxy disconnected"), 0);
    }

    #[tokio::test]
    async fn abandon_reclaims_slot_without_resolving() {
        let table = CorrelationTable::new();
        let (id, rx) = table.register(&ProxyRequest::Ping(PingRequest), Duration::from_secs(1));
        table.abandon(id);
        assert!(table.is_empty());
        // The receiver observes a closed channel, not a resolution.
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn concurrent_registrations_get_distinct_ids() {
        let table = std::sync::Arc::new(CorrelationTable::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let table = table.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..100 {
                    let (id, _rx) = table.register(&stop_worker(), Duration::from_secs(5));
                    ids.push(id);
                }
                ids
            }));
        }
        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: std::collections::HashSet<u64> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }
}
