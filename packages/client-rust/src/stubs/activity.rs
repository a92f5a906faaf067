//! Activity stub: heartbeating and external completion by task token.

use taskmux_core::messages::{
    ActivityCompleteRequest, ActivityGetHeartbeatDetailsRequest, ActivityRecordHeartbeatRequest,
};
use taskmux_core::{BridgeError, ProxyRequest, ReplyBody};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

/// Typed stub for activity-side operations.
#[derive(Clone)]
pub struct ActivityStub {
    handle: BridgeHandle,
}

impl ActivityStub {
    #[must_use]
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }

    /// Records progress details against a running activity attempt.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`]; `Remote` when the engine no
    /// longer knows the task token.
    pub async fn record_heartbeat(
        &self,
        task_token: &[u8],
        details: Option<Vec<u8>>,
    ) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::ActivityRecordHeartbeat(
                ActivityRecordHeartbeatRequest {
                    task_token: Some(task_token.to_vec()),
                    details,
                },
            ))
            .await?;
        match reply.body {
            ReplyBody::ActivityRecordHeartbeat(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Fetches the previous attempt's last recorded heartbeat details.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn heartbeat_details(
        &self,
        task_token: &[u8],
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::ActivityGetHeartbeatDetails(
                ActivityGetHeartbeatDetailsRequest {
                    task_token: Some(task_token.to_vec()),
                },
            ))
            .await?;
        match reply.body {
            ReplyBody::ActivityGetHeartbeatDetails(details) => Ok(details.details),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Completes an activity externally by task token.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn complete(&self, request: ActivityCompleteRequest) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::ActivityComplete(request))
            .await?;
        match reply.body {
            ReplyBody::ActivityComplete(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
