//! String-keyed property bag used as the wire representation of message fields.
//!
//! Every message variant flattens into a `PropertyBag` at the encoding
//! boundary and is rebuilt from one on decode. Values are canonical text
//! (decimal integers, `true`/`false`, base64 for binary, JSON for structured
//! sub-objects) so payloads stay human-inspectable and diff-friendly across
//! protocol versions. A value may also be present-but-null, which the wire
//! format distinguishes from an absent key.
//!
//! Accessor contract: getters never fail. A missing or null key decodes to
//! the type's zero value (empty string, `0`, `false`, `None` for binary and
//! structured values); `*_or` variants return the caller's default instead.
//! Setters always overwrite.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Ordered map of field name to optional encoded string value.
///
/// Insertion order is irrelevant to correctness but preserved for wire
/// stability, so re-encoding a decoded payload reproduces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: IndexMap<String, Option<String>>,
}

impl PropertyBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in the bag (null-valued keys count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the key is present, even with a null value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in insertion order. Used by the frame encoder.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Inserts a raw entry as decoded off the wire.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: Option<String>) {
        self.entries.insert(key.into(), value);
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Option::as_deref)
    }

    // -----------------------------------------------------------------------
    // String accessors
    // -----------------------------------------------------------------------

    /// Returns the string value, or `""` when the key is missing or null.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.raw(key).unwrap_or_default().to_string()
    }

    /// Returns the string value, or `default` when the key is missing or null.
    #[must_use]
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or(default).to_string()
    }

    /// Returns the string value, distinguishing missing/null from empty.
    #[must_use]
    pub fn get_opt_string(&self, key: &str) -> Option<String> {
        self.raw(key).map(str::to_string)
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), Some(value.into()));
    }

    /// Sets a nullable string: `None` stores an explicit null value.
    pub fn set_opt_string(&mut self, key: &str, value: Option<String>) {
        self.entries.insert(key.to_string(), value);
    }

    // -----------------------------------------------------------------------
    // Integer accessors (canonical decimal text)
    // -----------------------------------------------------------------------

    /// Returns the 32-bit integer value, or `0` when missing or unparsable.
    #[must_use]
    pub fn get_i32(&self, key: &str) -> i32 {
        self.get_i32_or(key, 0)
    }

    #[must_use]
    pub fn get_i32_or(&self, key: &str, default: i32) -> i32 {
        self.parse_or(key, default)
    }

    pub fn set_i32(&mut self, key: &str, value: i32) {
        self.set_string(key, value.to_string());
    }

    /// Returns the 64-bit integer value, or `0` when missing or unparsable.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> i64 {
        self.get_i64_or(key, 0)
    }

    #[must_use]
    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.parse_or(key, default)
    }

    pub fn set_i64(&mut self, key: &str, value: i64) {
        self.set_string(key, value.to_string());
    }

    /// Returns the unsigned 64-bit value, or `0` when missing or unparsable.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> u64 {
        self.get_u64_or(key, 0)
    }

    #[must_use]
    pub fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.parse_or(key, default)
    }

    pub fn set_u64(&mut self, key: &str, value: u64) {
        self.set_string(key, value.to_string());
    }

    // -----------------------------------------------------------------------
    // Bool / float accessors
    // -----------------------------------------------------------------------

    /// Returns the boolean value, or `false` when missing or unparsable.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_bool_or(key, false)
    }

    #[must_use]
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.parse_or(key, default)
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set_string(key, value.to_string());
    }

    /// Returns the 64-bit float value, or `0.0` when missing or unparsable.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> f64 {
        self.get_f64_or(key, 0.0)
    }

    #[must_use]
    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        self.parse_or(key, default)
    }

    pub fn set_f64(&mut self, key: &str, value: f64) {
        self.set_string(key, value.to_string());
    }

    // -----------------------------------------------------------------------
    // Duration accessors (canonical decimal milliseconds)
    // -----------------------------------------------------------------------

    /// Returns the duration value, or zero when missing or unparsable.
    #[must_use]
    pub fn get_duration(&self, key: &str) -> Duration {
        self.get_duration_or(key, Duration::ZERO)
    }

    #[must_use]
    pub fn get_duration_or(&self, key: &str, default: Duration) -> Duration {
        match self.raw(key) {
            Some(text) => match text.parse::<u64>() {
                Ok(millis) => Duration::from_millis(millis),
                Err(_) => {
                    tracing::debug!(key, value = text, "unparsable duration property");
                    default
                }
            },
            None => default,
        }
    }

    pub fn set_duration(&mut self, key: &str, value: Duration) {
        // Sub-millisecond precision is not representable on the wire.
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        self.set_string(key, millis.to_string());
    }

    /// Sets a nullable duration: `None` stores an explicit null value.
    pub fn set_opt_duration(&mut self, key: &str, value: Option<Duration>) {
        match value {
            Some(d) => self.set_duration(key, d),
            None => self.set_opt_string(key, None),
        }
    }

    /// Returns the duration, distinguishing missing/null from zero.
    #[must_use]
    pub fn get_opt_duration(&self, key: &str) -> Option<Duration> {
        self.raw(key)?;
        Some(self.get_duration(key))
    }

    // -----------------------------------------------------------------------
    // Binary accessors (base64 text)
    // -----------------------------------------------------------------------

    /// Returns the binary value, or `None` when missing, null, or undecodable.
    #[must_use]
    pub fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        let text = self.raw(key)?;
        match BASE64.decode(text) {
            Ok(bytes) => Some(bytes),
            Err(_) => {
                tracing::debug!(key, "undecodable binary property");
                None
            }
        }
    }

    /// Sets a binary value: `None` stores an explicit null value.
    pub fn set_bytes(&mut self, key: &str, value: Option<&[u8]>) {
        match value {
            Some(bytes) => self.set_string(key, BASE64.encode(bytes)),
            None => self.set_opt_string(key, None),
        }
    }

    // -----------------------------------------------------------------------
    // Structured sub-object accessors (JSON text)
    // -----------------------------------------------------------------------

    /// Decodes a structured sub-object stored as JSON under one key.
    ///
    /// Returns `None` when the key is missing, null, or fails to deserialize.
    /// The bag is self-similar: the JSON value can itself describe another
    /// message-shaped payload.
    #[must_use]
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.raw(key)?;
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(key, %err, "undecodable structured property");
                None
            }
        }
    }

    /// Encodes a structured sub-object as JSON under one key.
    ///
    /// `None` stores an explicit null value. Serialization of plain data
    /// types cannot fail; a failure would indicate a non-string map key or
    /// similar programming error, so it is debug-logged and the key nulled.
    pub fn set_json<T: Serialize>(&mut self, key: &str, value: Option<&T>) {
        match value {
            Some(v) => match serde_json::to_string(v) {
                Ok(text) => self.set_string(key, text),
                Err(err) => {
                    tracing::debug!(key, %err, "unserializable structured property");
                    self.set_opt_string(key, None);
                }
            },
            None => self.set_opt_string(key, None),
        }
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.raw(key) {
            Some(text) => match text.parse() {
                Ok(value) => value,
                Err(_) => {
                    tracing::debug!(key, value = text, "unparsable property");
                    default
                }
            },
            None => default,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
