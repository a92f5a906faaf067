//! Session-level request/reply pairs: handshake, connection, liveness, and
//! operation cancellation.

use std::time::Duration;

use super::PayloadSchema;
use crate::properties::PropertyBag;

// ---------------------------------------------------------------------------
// Initialize
// ---------------------------------------------------------------------------

/// Informs the proxy of the endpoint where the host listens for inbound
/// proxy messages. First message on a fresh channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeRequest {
    pub listen_address: Option<String>,
}

impl PayloadSchema for InitializeRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("ListenAddress", self.listen_address.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            listen_address: bag.get_opt_string("ListenAddress"),
        }
    }
}

/// Signals that the proxy is ready to receive traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitializeReply;

impl PayloadSchema for InitializeReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Connect
// ---------------------------------------------------------------------------

/// Asks the proxy to establish a connection to the orchestration engine
/// cluster on the host's behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Engine cluster endpoints, comma separated.
    pub endpoints: Option<String>,
    /// Client identity reported to the engine.
    pub identity: Option<String>,
    /// Default domain for subsequent operations.
    pub domain: Option<String>,
    /// How long the proxy may spend establishing the connection.
    pub client_timeout: Duration,
    /// Register the default domain if it does not exist yet.
    pub create_domain: bool,
    /// Connection attempts before giving up.
    pub retry_attempts: i32,
    /// Delay between connection attempts.
    pub retry_delay: Duration,
}

impl PayloadSchema for ConnectRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Endpoints", self.endpoints.clone());
        bag.set_opt_string("Identity", self.identity.clone());
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_duration("ClientTimeout", self.client_timeout);
        bag.set_bool("CreateDomain", self.create_domain);
        bag.set_i32("RetryAttempts", self.retry_attempts);
        bag.set_duration("RetryDelay", self.retry_delay);
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            endpoints: bag.get_opt_string("Endpoints"),
            identity: bag.get_opt_string("Identity"),
            domain: bag.get_opt_string("Domain"),
            client_timeout: bag.get_duration("ClientTimeout"),
            create_domain: bag.get_bool("CreateDomain"),
            retry_attempts: bag.get_i32("RetryAttempts"),
            retry_delay: bag.get_duration("RetryDelay"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectReply;

impl PayloadSchema for ConnectReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Terminate
// ---------------------------------------------------------------------------

/// Asks the proxy to shut down gracefully after replying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminateRequest;

impl PayloadSchema for TerminateRequest {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminateReply;

impl PayloadSchema for TerminateReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Heartbeat / Ping
// ---------------------------------------------------------------------------

/// Periodic liveness probe from host to proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatRequest;

impl PayloadSchema for HeartbeatRequest {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReply;

impl PayloadSchema for HeartbeatReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

/// Raw round-trip measurement; the receiver responds immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingRequest;

impl PayloadSchema for PingRequest {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingReply;

impl PayloadSchema for PingReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// Asks the proxy to cancel a previously submitted, still pending operation
/// identified by its correlation id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelRequest {
    pub target_request_id: u64,
}

impl PayloadSchema for CancelRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_u64("TargetRequestId", self.target_request_id);
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            target_request_id: bag.get_u64("TargetRequestId"),
        }
    }
}

/// Whether the target operation was actually cancelled, as opposed to
/// having already completed or never existed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelReply {
    pub was_cancelled: bool,
}

impl PayloadSchema for CancelReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bool("WasCancelled", self.was_cancelled);
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            was_cancelled: bag.get_bool("WasCancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: PayloadSchema + PartialEq + std::fmt::Debug>(msg: &T) {
        let mut bag = PropertyBag::new();
        msg.write(&mut bag);
        assert_eq!(&T::read(&bag), msg);
    }

    #[test]
    fn connect_request_full_roundtrip() {
        roundtrip(&ConnectRequest {
            endpoints: Some("engine-0:7933,engine-1:7933".to_string()),
            identity: Some("host-17".to_string()),
            domain: Some("orders".to_string()),
            client_timeout: Duration::from_secs(30),
            create_domain: true,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
        });
    }

    #[test]
    fn connect_request_defaults_roundtrip() {
        roundtrip(&ConnectRequest::default());
    }

    #[test]
    fn initialize_request_roundtrip() {
        roundtrip(&InitializeRequest {
            listen_address: Some("127.0.0.1:9099".to_string()),
        });
        roundtrip(&InitializeRequest::default());
    }

    #[test]
    fn cancel_pair_roundtrip() {
        roundtrip(&CancelRequest {
            target_request_id: 77,
        });
        roundtrip(&CancelReply {
            was_cancelled: true,
        });
    }

    #[test]
    fn empty_payload_messages_write_no_fields() {
        let mut bag = PropertyBag::new();
        HeartbeatRequest.write(&mut bag);
        PingRequest.write(&mut bag);
        TerminateRequest.write(&mut bag);
        assert!(bag.is_empty());
    }
}
