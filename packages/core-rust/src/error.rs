//! Error taxonomy shared by the bridge crates.
//!
//! Only `MalformedPayload` is transport-fatal: once a frame fails to decode
//! the stream can no longer be trusted and the bridge tears down, cancelling
//! everything in flight. Every other kind resolves a single operation and
//! surfaces to its caller as a typed failure.

use serde::{Deserialize, Serialize};

/// Failure reported by the proxy or the orchestration engine for one
/// operation. Travels on the wire as a JSON property of reply envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("remote failure [{code}]: {message}")]
pub struct RemoteError {
    /// Engine-supplied failure code, e.g. `"EntityNotExists"`.
    pub code: String,
    /// Engine-supplied failure message.
    pub message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors produced by the bridge and surfaced through stub calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// A frame failed to decode. The stream is no longer trustworthy and
    /// the transport must be torn down.
    #[error("malformed payload: {detail}")]
    MalformedPayload { detail: String },

    /// The frame discriminator has no registered constructor. The affected
    /// operation fails; the transport stays open.
    #[error("unknown message type {discriminator}")]
    UnknownMessageType { discriminator: u32 },

    /// A reply arrived whose variant does not match the one statically
    /// expected for the originating request.
    #[error("protocol error: {detail}")]
    ProtocolError { detail: String },

    /// The operation's deadline elapsed before a reply arrived.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The operation was abandoned by shutdown, disconnect, or an explicit
    /// cancel.
    #[error("operation cancelled: {reason}")]
    Cancelled { reason: String },

    /// The proxy or engine reported the operation failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl BridgeError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedPayload {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the whole stream rather than a single
    /// operation.
    #[must_use]
    pub fn is_transport_fatal(&self) -> bool {
        matches!(self, Self::MalformedPayload { .. })
    }
}
