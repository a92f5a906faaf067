//! Worker side of the bridge: registration of user workflow/activity
//! functions, inbound invocation dispatch, and the hosting frames.

pub mod context;
pub mod dispatch;
pub mod outcome;
pub mod registry;

pub use context::{ActivityContext, WorkflowContext};
pub use dispatch::Worker;
pub use outcome::{ContinuationSignal, WorkflowOutcome};
pub use registry::{ActivityHandler, WorkerRegistry, WorkflowHandler};
