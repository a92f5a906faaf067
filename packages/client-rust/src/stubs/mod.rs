//! Stub dispatch layer: user-facing call surfaces over the correlation
//! engine.
//!
//! Typed stubs map each method to exactly one request variant and decode
//! the reply into the method's result shape. The untyped workflow stub
//! leaves operation names and payload encoding to the caller for targets
//! not known at compile time.

pub mod activity;
pub mod domain;
pub mod session;
pub mod untyped;
pub mod worker;
pub mod workflow;

pub use activity::ActivityStub;
pub use domain::DomainStub;
pub use session::SessionStub;
pub use untyped::UntypedWorkflowStub;
pub use worker::WorkerStub;
pub use workflow::{WorkflowRun, WorkflowStub};

use taskmux_core::{BridgeError, ProxyReply};

/// The correlation engine has already validated the reply variant against
/// the request's static expectation, so a stub-side mismatch indicates a
/// pairing bug rather than peer behavior.
pub(crate) fn unexpected_reply(reply: &ProxyReply) -> BridgeError {
    BridgeError::ProtocolError {
        detail: format!("unexpected reply variant {:?}", reply.message_type()),
    }
}
