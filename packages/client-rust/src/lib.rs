//! `taskmux` Client — correlation engine, framed proxy transport, stub
//! dispatch, and worker hosting for the orchestration-engine bridge.

pub mod bridge;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod stubs;
pub mod transport;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{Bridge, BridgeHandle, BridgeState};
pub use codec::{FrameCodec, InboundFrame, TransportError};
pub use config::BridgeConfig;
pub use correlation::CorrelationTable;
pub use stubs::{
    ActivityStub, DomainStub, SessionStub, UntypedWorkflowStub, WorkerStub, WorkflowRun,
    WorkflowStub,
};
pub use worker::{
    ActivityContext, ActivityHandler, ContinuationSignal, Worker, WorkerRegistry,
    WorkflowContext, WorkflowHandler, WorkflowOutcome,
};
