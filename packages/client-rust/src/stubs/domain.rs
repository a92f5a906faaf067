//! Domain stub: registration and metadata management.

use taskmux_core::messages::{
    DomainDeprecateRequest, DomainDescribeRequest, DomainRegisterRequest, DomainUpdateRequest,
};
use taskmux_core::{BridgeError, DomainInfo, ProxyRequest, ReplyBody};

use super::unexpected_reply;
use crate::bridge::BridgeHandle;

/// Typed stub for domain management.
#[derive(Clone)]
pub struct DomainStub {
    handle: BridgeHandle,
}

impl DomainStub {
    #[must_use]
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }

    /// Registers a new domain.
    ///
    /// # Errors
    ///
    /// `Remote` with the engine's code when registration is rejected (for
    /// example an already-existing domain); otherwise any operation-local
    /// [`BridgeError`].
    pub async fn register(&self, options: DomainRegisterRequest) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::DomainRegister(options))
            .await?;
        match reply.body {
            ReplyBody::DomainRegister(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Fetches a domain's metadata. `None` when the engine reports no
    /// metadata for an existing name.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn describe(&self, name: &str) -> Result<Option<DomainInfo>, BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::DomainDescribe(DomainDescribeRequest {
                name: Some(name.to_string()),
            }))
            .await?;
        match reply.body {
            ReplyBody::DomainDescribe(describe) => Ok(describe.info),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Updates a domain's metadata.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn update(&self, options: DomainUpdateRequest) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::DomainUpdate(options))
            .await?;
        match reply.body {
            ReplyBody::DomainUpdate(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }

    /// Deprecates a domain, preventing new executions.
    ///
    /// # Errors
    ///
    /// Any operation-local [`BridgeError`].
    pub async fn deprecate(
        &self,
        name: &str,
        security_token: Option<String>,
    ) -> Result<(), BridgeError> {
        let reply = self
            .handle
            .submit(ProxyRequest::DomainDeprecate(DomainDeprecateRequest {
                name: Some(name.to_string()),
                security_token,
            }))
            .await?;
        match reply.body {
            ReplyBody::DomainDeprecate(_) => Ok(()),
            _ => Err(unexpected_reply(&reply)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
