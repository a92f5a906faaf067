//! Activity request/reply pairs: heartbeating, external completion, and the
//! proxy-driven invocation pair.

use super::PayloadSchema;
use crate::error::RemoteError;
use crate::properties::PropertyBag;

// ---------------------------------------------------------------------------
// Invoke (proxy -> client)
// ---------------------------------------------------------------------------

/// Proxy-driven request to run a registered activity function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityInvokeRequest {
    pub activity_id: Option<String>,
    pub activity_type: Option<String>,
    pub args: Option<Vec<u8>>,
    /// Engine task token identifying this activity attempt. Passed back by
    /// heartbeats and external completion.
    pub task_token: Option<Vec<u8>>,
}

impl PayloadSchema for ActivityInvokeRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("ActivityId", self.activity_id.clone());
        bag.set_opt_string("ActivityType", self.activity_type.clone());
        bag.set_bytes("Args", self.args.as_deref());
        bag.set_bytes("TaskToken", self.task_token.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            activity_id: bag.get_opt_string("ActivityId"),
            activity_type: bag.get_opt_string("ActivityType"),
            args: bag.get_bytes("Args"),
            task_token: bag.get_bytes("TaskToken"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityInvokeReply {
    pub result: Option<Vec<u8>>,
}

impl PayloadSchema for ActivityInvokeReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("Result", self.result.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            result: bag.get_bytes("Result"),
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// Records progress details for a running activity attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityRecordHeartbeatRequest {
    pub task_token: Option<Vec<u8>>,
    pub details: Option<Vec<u8>>,
}

impl PayloadSchema for ActivityRecordHeartbeatRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("TaskToken", self.task_token.as_deref());
        bag.set_bytes("Details", self.details.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            task_token: bag.get_bytes("TaskToken"),
            details: bag.get_bytes("Details"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityRecordHeartbeatReply;

impl PayloadSchema for ActivityRecordHeartbeatReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

/// Fetches the details recorded by the previous attempt's last heartbeat,
/// letting a retried activity resume from checkpointed progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityGetHeartbeatDetailsRequest {
    pub task_token: Option<Vec<u8>>,
}

impl PayloadSchema for ActivityGetHeartbeatDetailsRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("TaskToken", self.task_token.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            task_token: bag.get_bytes("TaskToken"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityGetHeartbeatDetailsReply {
    pub details: Option<Vec<u8>>,
}

impl PayloadSchema for ActivityGetHeartbeatDetailsReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_bytes("Details", self.details.as_deref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            details: bag.get_bytes("Details"),
        }
    }
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Completes an activity externally by task token, for activities whose
/// real work finishes outside the worker that was invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityCompleteRequest {
    pub domain: Option<String>,
    pub task_token: Option<Vec<u8>>,
    pub workflow_id: Option<String>,
    pub run_id: Option<String>,
    pub activity_id: Option<String>,
    /// Success payload; ignored when `error` is set.
    pub result: Option<Vec<u8>>,
    /// Failure to record instead of a result.
    pub error: Option<RemoteError>,
}

impl PayloadSchema for ActivityCompleteRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_bytes("TaskToken", self.task_token.as_deref());
        bag.set_opt_string("WorkflowId", self.workflow_id.clone());
        bag.set_opt_string("RunId", self.run_id.clone());
        bag.set_opt_string("ActivityId", self.activity_id.clone());
        bag.set_bytes("Result", self.result.as_deref());
        bag.set_json("CompleteError", self.error.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            task_token: bag.get_bytes("TaskToken"),
            workflow_id: bag.get_opt_string("WorkflowId"),
            run_id: bag.get_opt_string("RunId"),
            activity_id: bag.get_opt_string("ActivityId"),
            result: bag.get_bytes("Result"),
            error: bag.get_json("CompleteError"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCompleteReply;

impl PayloadSchema for ActivityCompleteReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
