//! Stream codec for proxy frames.
//!
//! Adds a `u32` little-endian length prefix around the core frame encoding
//! so the byte stream stays recoverable: a frame that fails field-level
//! decoding is still consumed as a whole.
//!
//! Unknown discriminators surface as [`InboundFrame::Unknown`] rather than
//! a decoder error, because they are operation-local: the read loop fails
//! the one correlated operation and keeps the stream open. Malformed frames
//! do error the decoder, which tears the transport down.

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use taskmux_core::messages::envelope::peek_frame_header;
use taskmux_core::{decode_frame, encode_frame, BridgeError, Envelope, TypeRegistry};
use tokio_util::codec::{Decoder, Encoder};

/// Length-prefix size preceding every frame.
const PREFIX_LEN: usize = 4;

/// Errors crossing the framed transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Frame(#[from] BridgeError),
}

/// One decoded unit off the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Envelope(Envelope),
    /// The discriminator had no registry entry. The frame was consumed; the
    /// correlation id lets the read loop fail the matching operation.
    Unknown {
        discriminator: u32,
        correlation_id: u64,
    },
}

/// Frame codec parameterized by the decode registry.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    registry: Arc<TypeRegistry>,
    max_frame_len: usize,
}

impl FrameCodec {
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>, max_frame_len: usize) -> Self {
        Self {
            registry,
            max_frame_len,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = InboundFrame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<InboundFrame>, TransportError> {
        if src.len() < PREFIX_LEN {
            return Ok(None);
        }
        let frame_len = u32::from_le_bytes(src[..PREFIX_LEN].try_into().expect("4 bytes")) as usize;
        if frame_len > self.max_frame_len {
            return Err(BridgeError::MalformedPayload {
                detail: format!("frame length {frame_len} exceeds limit {}", self.max_frame_len),
            }
            .into());
        }
        if src.len() < PREFIX_LEN + frame_len {
            src.reserve(PREFIX_LEN + frame_len - src.len());
            return Ok(None);
        }
        src.advance(PREFIX_LEN);
        let frame = src.split_to(frame_len);

        match decode_frame(&frame, &self.registry) {
            Ok(envelope) => Ok(Some(InboundFrame::Envelope(envelope))),
            Err(BridgeError::UnknownMessageType { discriminator }) => {
                let (_, correlation_id) = peek_frame_header(&frame)?;
                Ok(Some(InboundFrame::Unknown {
                    discriminator,
                    correlation_id,
                }))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Encoder<Envelope> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), TransportError> {
        let frame = encode_frame(&item);
        if frame.len() > self.max_frame_len {
            return Err(BridgeError::MalformedPayload {
                detail: format!(
                    "outbound frame length {} exceeds limit {}",
                    frame.len(),
                    self.max_frame_len
                ),
            }
            .into());
        }
        dst.reserve(PREFIX_LEN + frame.len());
        // Bounded by max_frame_len, which fits u32.
        #[allow(clippy::cast_possible_truncation)]
        dst.put_u32_le(frame.len() as u32);
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
