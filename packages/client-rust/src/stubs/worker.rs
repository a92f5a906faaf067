//! Worker lifecycle stub.

use taskmux_core::messages::{NewWorkerRequest, StopWorkerRequest};
use taskmux_core::{BridgeError, ProxyRequest, ReplyBody, WorkerOptions};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

/// Typed stub for starting and stopping engine workers.
#[derive(Clone)]
pub struct WorkerStub {
    handle: BridgeHandle,
}

impl WorkerStub {
    #[must_use]
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }

    /// Starts a worker for the domain/task-list pair and returns the
    /// engine-assigned worker id.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn start(
        &self,
        domain: &str,
        task_list: &str,
        options: Option<WorkerOptions>,
    ) -> Result<i64, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::NewWorker(NewWorkerRequest {
                domain: Some(domain.to_string()),
                task_list: Some(task_list.to_string()),
                options,
            }))
            .await?;
        match reply.body {
            ReplyBody::NewWorker(new_worker) => Ok(new_worker.worker_id),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Stops a previously started worker.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn stop(&self, worker_id: i64) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::StopWorker(StopWorkerRequest { worker_id }))
            .await?;
        match reply.body {
            ReplyBody::StopWorker(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
