//! Wire framing for proxy messages.
//!
//! Frame layout, all integers little-endian:
//!
//! ```text
//! [discriminator: u32][correlation-id: u64][field-count: u32]
//! [field: (name-len i32, name, value-tag u8, value-len i32, value)]*
//! ```
//!
//! A correlation id of `0` is the "absent" sentinel; allocation starts at 1.
//! A length of `-1` encodes a null value, distinct from an empty one. The
//! per-field value tag identifies the value encoding; today every value is
//! canonical UTF-8 text (tag 1) or null (tag 0), leaving room for future
//! encodings without reframing.
//!
//! Frames are not self-delimiting on a stream; the transport layer adds an
//! outer length prefix so a bad frame cannot desynchronize the stream.

use std::collections::HashMap;

use super::{MessageType, ProxyMessage, ProxyReply, ProxyRequest};
use crate::error::BridgeError;
use crate::properties::PropertyBag;

/// Value encoding tags. Null carries no bytes; text is canonical UTF-8.
const TAG_NULL: u8 = 0;
const TAG_TEXT: u8 = 1;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One framed message plus its correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Matches a reply to its originating request; `0` means uncorrelated.
    pub correlation_id: u64,
    pub message: ProxyMessage,
}

impl Envelope {
    #[must_use]
    pub fn request(correlation_id: u64, request: ProxyRequest) -> Self {
        Self {
            correlation_id,
            message: ProxyMessage::Request(request),
        }
    }

    #[must_use]
    pub fn reply(correlation_id: u64, reply: ProxyReply) -> Self {
        Self {
            correlation_id,
            message: ProxyMessage::Reply(reply),
        }
    }

    /// Wire discriminator of the carried message.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message.message_type()
    }
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Explicit decode table mapping wire discriminators to message
/// constructors.
///
/// Assembled once at process start and passed into the bridge; read-only
/// after that, so no registration can race live traffic. Decoding a
/// discriminator without an entry fails with
/// [`BridgeError::UnknownMessageType`].
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: HashMap<u32, MessageType>,
}

impl TypeRegistry {
    /// An empty table; useful for tests exercising unknown-type handling.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The full table covering every message pair the bridge speaks.
    #[must_use]
    pub fn bridge_default() -> Self {
        let mut registry = Self::empty();
        for mt in MessageType::ALL {
            registry.register(mt);
        }
        registry
    }

    /// Adds one constructor entry. Idempotent.
    pub fn register(&mut self, message_type: MessageType) {
        self.entries.insert(message_type as u32, message_type);
    }

    #[must_use]
    pub fn contains(&self, discriminator: u32) -> bool {
        self.entries.contains_key(&discriminator)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, discriminator: u32) -> Option<MessageType> {
        self.entries.get(&discriminator).copied()
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encodes an envelope into a frame.
#[must_use]
pub fn encode_frame(envelope: &Envelope) -> Vec<u8> {
    let mut bag = PropertyBag::new();
    envelope.message.write_fields(&mut bag);

    let mut buf = Vec::with_capacity(64);
    write_u32(&mut buf, envelope.message_type() as u32);
    write_u64(&mut buf, envelope.correlation_id);
    // Field count fits u32: bag keys are bounded by message schemas.
    #[allow(clippy::cast_possible_truncation)]
    write_u32(&mut buf, bag.len() as u32);
    for (name, value) in bag.entries() {
        write_str(&mut buf, Some(name));
        match value {
            Some(text) => {
                buf.push(TAG_TEXT);
                write_str(&mut buf, Some(text));
            }
            None => {
                buf.push(TAG_NULL);
                write_str(&mut buf, None);
            }
        }
    }
    buf
}

/// Reads a frame's discriminator and correlation id without decoding the
/// fields. Lets the transport fail a correlated operation even when the
/// discriminator itself is unknown.
///
/// # Errors
///
/// Returns [`BridgeError::MalformedPayload`] when the buffer is shorter
/// than the fixed header.
pub fn peek_frame_header(buf: &[u8]) -> Result<(u32, u64), BridgeError> {
    let mut reader = Reader::new(buf);
    let discriminator = reader.read_u32()?;
    let correlation_id = reader.read_u64()?;
    Ok((discriminator, correlation_id))
}

/// Decodes a frame into an envelope using the given registry.
///
/// # Errors
///
/// Returns [`BridgeError::UnknownMessageType`] when the discriminator has
/// no registry entry, and [`BridgeError::MalformedPayload`] when the frame
/// is truncated, carries an inconsistent field count, or holds invalid
/// text.
pub fn decode_frame(buf: &[u8], registry: &TypeRegistry) -> Result<Envelope, BridgeError> {
    let mut reader = Reader::new(buf);
    let discriminator = reader.read_u32()?;
    let correlation_id = reader.read_u64()?;

    let Some(message_type) = registry.lookup(discriminator) else {
        return Err(BridgeError::UnknownMessageType { discriminator });
    };

    let field_count = reader.read_u32()?;
    let mut bag = PropertyBag::new();
    for _ in 0..field_count {
        let name = reader.read_str()?.ok_or_else(|| {
            BridgeError::malformed("null field name")
        })?;
        let tag = reader.read_u8()?;
        let value = reader.read_str()?;
        match tag {
            TAG_TEXT if value.is_some() => bag.insert_raw(name, value),
            TAG_NULL if value.is_none() => bag.insert_raw(name, None),
            _ => {
                return Err(BridgeError::malformed(format!(
                    "value tag {tag} inconsistent with value presence"
                )))
            }
        }
    }
    if !reader.at_end() {
        return Err(BridgeError::malformed(
            "trailing bytes after declared field count",
        ));
    }

    ProxyMessage::read(message_type, &bag)
        .map(|message| Envelope {
            correlation_id,
            message,
        })
        .ok_or(BridgeError::UnknownMessageType { discriminator })
}

fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_str(buf: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(text) => {
            // Individual property values are far below i32::MAX.
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            write_i32(buf, text.len() as i32);
            buf.extend_from_slice(text.as_bytes());
        }
        None => write_i32(buf, -1),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BridgeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| BridgeError::malformed("truncated frame"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, BridgeError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, BridgeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4 bytes")))
    }

    fn read_u64(&mut self) -> Result<u64, BridgeError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8 bytes")))
    }

    fn read_i32(&mut self) -> Result<i32, BridgeError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes(bytes.try_into().expect("4 bytes")))
    }

    fn read_str(&mut self) -> Result<Option<String>, BridgeError> {
        let len = self.read_i32()?;
        if len == -1 {
            return Ok(None);
        }
        let len = usize::try_from(len)
            .map_err(|_| BridgeError::malformed(format!("negative length {len}")))?;
        let bytes = self.take(len)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|_| BridgeError::malformed("invalid utf-8 in frame"))?;
        Ok(Some(text.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
