//! Message schemas for the proxy protocol.
//!
//! Each submodule covers one domain of request/reply pairs. Messages are a
//! closed set of tagged variants with explicit field schemas; the
//! string-keyed [`PropertyBag`](crate::PropertyBag) appears only at the wire
//! boundary, where [`envelope`] flattens variants into frames and back.
//!
//! Every request variant declares the reply variant it expects through
//! [`ProxyRequest::reply_type`], a static mapping used for decode dispatch
//! on the receiving side and reply validation on the sending side.

pub mod activity;
pub mod domain;
pub mod envelope;
pub mod session;
pub mod worker;
pub mod workflow;

use crate::error::RemoteError;
use crate::properties::PropertyBag;

pub use activity::{
    ActivityCompleteReply, ActivityCompleteRequest, ActivityGetHeartbeatDetailsReply,
    ActivityGetHeartbeatDetailsRequest, ActivityInvokeReply, ActivityInvokeRequest,
    ActivityRecordHeartbeatReply, ActivityRecordHeartbeatRequest,
};
pub use domain::{
    DomainDeprecateReply, DomainDeprecateRequest, DomainDescribeReply, DomainDescribeRequest,
    DomainRegisterReply, DomainRegisterRequest, DomainUpdateReply, DomainUpdateRequest,
};
pub use envelope::{decode_frame, encode_frame, peek_frame_header, Envelope, TypeRegistry};
pub use session::{
    CancelReply, CancelRequest, ConnectReply, ConnectRequest, HeartbeatReply, HeartbeatRequest,
    InitializeReply, InitializeRequest, PingReply, PingRequest, TerminateReply, TerminateRequest,
};
pub use worker::{NewWorkerReply, NewWorkerRequest, StopWorkerReply, StopWorkerRequest};
pub use workflow::{
    WorkflowContinueAsNewReply, WorkflowContinueAsNewRequest, WorkflowExecuteReply,
    WorkflowExecuteRequest, WorkflowGetResultReply, WorkflowGetResultRequest,
    WorkflowInvokeReply, WorkflowInvokeRequest, WorkflowQueryReply, WorkflowQueryRequest,
    WorkflowSignalReply, WorkflowSignalRequest,
};

/// Conversion between a message variant's typed fields and the wire-level
/// property bag. Reads are infallible: absent keys decode to field defaults,
/// matching the forward-compatibility contract of the bag itself.
pub(crate) trait PayloadSchema: Sized {
    fn write(&self, bag: &mut PropertyBag);
    fn read(bag: &PropertyBag) -> Self;
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Numeric discriminator identifying each concrete message on the wire.
///
/// Session and domain pairs occupy the low range, workflow pairs start at
/// 100 and activity pairs at 200, leaving each area room to grow without
/// renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// Never travels on the wire; decoding a frame with this discriminator
    /// is an error.
    Unspecified = 0,

    InitializeRequest = 1,
    InitializeReply = 2,
    ConnectRequest = 3,
    ConnectReply = 4,
    TerminateRequest = 5,
    TerminateReply = 6,
    DomainRegisterRequest = 7,
    DomainRegisterReply = 8,
    DomainDescribeRequest = 9,
    DomainDescribeReply = 10,
    DomainUpdateRequest = 11,
    DomainUpdateReply = 12,
    HeartbeatRequest = 13,
    HeartbeatReply = 14,
    CancelRequest = 15,
    CancelReply = 16,
    NewWorkerRequest = 17,
    NewWorkerReply = 18,
    StopWorkerRequest = 19,
    StopWorkerReply = 20,
    PingRequest = 21,
    PingReply = 22,
    DomainDeprecateRequest = 23,
    DomainDeprecateReply = 24,

    WorkflowExecuteRequest = 100,
    WorkflowExecuteReply = 101,
    WorkflowSignalRequest = 102,
    WorkflowSignalReply = 103,
    WorkflowQueryRequest = 104,
    WorkflowQueryReply = 105,
    WorkflowGetResultRequest = 106,
    WorkflowGetResultReply = 107,
    WorkflowContinueAsNewRequest = 108,
    WorkflowContinueAsNewReply = 109,
    WorkflowInvokeRequest = 110,
    WorkflowInvokeReply = 111,

    ActivityInvokeRequest = 200,
    ActivityInvokeReply = 201,
    ActivityRecordHeartbeatRequest = 202,
    ActivityRecordHeartbeatReply = 203,
    ActivityGetHeartbeatDetailsRequest = 204,
    ActivityGetHeartbeatDetailsReply = 205,
    ActivityCompleteRequest = 206,
    ActivityCompleteReply = 207,
}

impl MessageType {
    /// Every concrete wire type, in discriminator order. The default type
    /// registry is built from this table.
    pub const ALL: [Self; 44] = [
        Self::InitializeRequest,
        Self::InitializeReply,
        Self::ConnectRequest,
        Self::ConnectReply,
        Self::TerminateRequest,
        Self::TerminateReply,
        Self::DomainRegisterRequest,
        Self::DomainRegisterReply,
        Self::DomainDescribeRequest,
        Self::DomainDescribeReply,
        Self::DomainUpdateRequest,
        Self::DomainUpdateReply,
        Self::HeartbeatRequest,
        Self::HeartbeatReply,
        Self::CancelRequest,
        Self::CancelReply,
        Self::NewWorkerRequest,
        Self::NewWorkerReply,
        Self::StopWorkerRequest,
        Self::StopWorkerReply,
        Self::PingRequest,
        Self::PingReply,
        Self::DomainDeprecateRequest,
        Self::DomainDeprecateReply,
        Self::WorkflowExecuteRequest,
        Self::WorkflowExecuteReply,
        Self::WorkflowSignalRequest,
        Self::WorkflowSignalReply,
        Self::WorkflowQueryRequest,
        Self::WorkflowQueryReply,
        Self::WorkflowGetResultRequest,
        Self::WorkflowGetResultReply,
        Self::WorkflowContinueAsNewRequest,
        Self::WorkflowContinueAsNewReply,
        Self::WorkflowInvokeRequest,
        Self::WorkflowInvokeReply,
        Self::ActivityInvokeRequest,
        Self::ActivityInvokeReply,
        Self::ActivityRecordHeartbeatRequest,
        Self::ActivityRecordHeartbeatReply,
        Self::ActivityGetHeartbeatDetailsRequest,
        Self::ActivityGetHeartbeatDetailsReply,
        Self::ActivityCompleteRequest,
        Self::ActivityCompleteReply,
    ];

    /// Maps a raw discriminator back to a known type.
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|mt| *mt as u32 == value)
    }

    /// Whether this type belongs to the reply family.
    #[must_use]
    pub fn is_reply(self) -> bool {
        matches!(
            self,
            Self::InitializeReply
                | Self::ConnectReply
                | Self::TerminateReply
                | Self::DomainRegisterReply
                | Self::DomainDescribeReply
                | Self::DomainUpdateReply
                | Self::HeartbeatReply
                | Self::CancelReply
                | Self::NewWorkerReply
                | Self::StopWorkerReply
                | Self::PingReply
                | Self::DomainDeprecateReply
                | Self::WorkflowExecuteReply
                | Self::WorkflowSignalReply
                | Self::WorkflowQueryReply
                | Self::WorkflowGetResultReply
                | Self::WorkflowContinueAsNewReply
                | Self::WorkflowInvokeReply
                | Self::ActivityInvokeReply
                | Self::ActivityRecordHeartbeatReply
                | Self::ActivityGetHeartbeatDetailsReply
                | Self::ActivityCompleteReply
        )
    }
}

// ---------------------------------------------------------------------------
// ProxyRequest
// ---------------------------------------------------------------------------

/// The closed set of request variants.
///
/// Includes both client-to-proxy calls and the two inbound invocations the
/// proxy drives back into the host (`WorkflowInvoke`, `ActivityInvoke`).
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyRequest {
    Initialize(InitializeRequest),
    Connect(ConnectRequest),
    Terminate(TerminateRequest),
    Heartbeat(HeartbeatRequest),
    Ping(PingRequest),
    Cancel(CancelRequest),
    DomainRegister(DomainRegisterRequest),
    DomainDescribe(DomainDescribeRequest),
    DomainUpdate(DomainUpdateRequest),
    DomainDeprecate(DomainDeprecateRequest),
    NewWorker(NewWorkerRequest),
    StopWorker(StopWorkerRequest),
    WorkflowExecute(WorkflowExecuteRequest),
    WorkflowSignal(WorkflowSignalRequest),
    WorkflowQuery(WorkflowQueryRequest),
    WorkflowGetResult(WorkflowGetResultRequest),
    WorkflowContinueAsNew(WorkflowContinueAsNewRequest),
    WorkflowInvoke(WorkflowInvokeRequest),
    ActivityInvoke(ActivityInvokeRequest),
    ActivityRecordHeartbeat(ActivityRecordHeartbeatRequest),
    ActivityGetHeartbeatDetails(ActivityGetHeartbeatDetailsRequest),
    ActivityComplete(ActivityCompleteRequest),
}

impl ProxyRequest {
    /// Wire discriminator of this request.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Initialize(_) => MessageType::InitializeRequest,
            Self::Connect(_) => MessageType::ConnectRequest,
            Self::Terminate(_) => MessageType::TerminateRequest,
            Self::Heartbeat(_) => MessageType::HeartbeatRequest,
            Self::Ping(_) => MessageType::PingRequest,
            Self::Cancel(_) => MessageType::CancelRequest,
            Self::DomainRegister(_) => MessageType::DomainRegisterRequest,
            Self::DomainDescribe(_) => MessageType::DomainDescribeRequest,
            Self::DomainUpdate(_) => MessageType::DomainUpdateRequest,
            Self::DomainDeprecate(_) => MessageType::DomainDeprecateRequest,
            Self::NewWorker(_) => MessageType::NewWorkerRequest,
            Self::StopWorker(_) => MessageType::StopWorkerRequest,
            Self::WorkflowExecute(_) => MessageType::WorkflowExecuteRequest,
            Self::WorkflowSignal(_) => MessageType::WorkflowSignalRequest,
            Self::WorkflowQuery(_) => MessageType::WorkflowQueryRequest,
            Self::WorkflowGetResult(_) => MessageType::WorkflowGetResultRequest,
            Self::WorkflowContinueAsNew(_) => MessageType::WorkflowContinueAsNewRequest,
            Self::WorkflowInvoke(_) => MessageType::WorkflowInvokeRequest,
            Self::ActivityInvoke(_) => MessageType::ActivityInvokeRequest,
            Self::ActivityRecordHeartbeat(_) => MessageType::ActivityRecordHeartbeatRequest,
            Self::ActivityGetHeartbeatDetails(_) => {
                MessageType::ActivityGetHeartbeatDetailsRequest
            }
            Self::ActivityComplete(_) => MessageType::ActivityCompleteRequest,
        }
    }

    /// The reply variant this request expects. Static per variant: the
    /// correlation engine validates inbound replies against it.
    #[must_use]
    pub fn reply_type(&self) -> MessageType {
        match self {
            Self::Initialize(_) => MessageType::InitializeReply,
            Self::Connect(_) => MessageType::ConnectReply,
            Self::Terminate(_) => MessageType::TerminateReply,
            Self::Heartbeat(_) => MessageType::HeartbeatReply,
            Self::Ping(_) => MessageType::PingReply,
            Self::Cancel(_) => MessageType::CancelReply,
            Self::DomainRegister(_) => MessageType::DomainRegisterReply,
            Self::DomainDescribe(_) => MessageType::DomainDescribeReply,
            Self::DomainUpdate(_) => MessageType::DomainUpdateReply,
            Self::DomainDeprecate(_) => MessageType::DomainDeprecateReply,
            Self::NewWorker(_) => MessageType::NewWorkerReply,
            Self::StopWorker(_) => MessageType::StopWorkerReply,
            Self::WorkflowExecute(_) => MessageType::WorkflowExecuteReply,
            Self::WorkflowSignal(_) => MessageType::WorkflowSignalReply,
            Self::WorkflowQuery(_) => MessageType::WorkflowQueryReply,
            Self::WorkflowGetResult(_) => MessageType::WorkflowGetResultReply,
            Self::WorkflowContinueAsNew(_) => MessageType::WorkflowContinueAsNewReply,
            Self::WorkflowInvoke(_) => MessageType::WorkflowInvokeReply,
            Self::ActivityInvoke(_) => MessageType::ActivityInvokeReply,
            Self::ActivityRecordHeartbeat(_) => MessageType::ActivityRecordHeartbeatReply,
            Self::ActivityGetHeartbeatDetails(_) => {
                MessageType::ActivityGetHeartbeatDetailsReply
            }
            Self::ActivityComplete(_) => MessageType::ActivityCompleteReply,
        }
    }

    pub(crate) fn write_fields(&self, bag: &mut PropertyBag) {
        match self {
            Self::Initialize(m) => m.write(bag),
            Self::Connect(m) => m.write(bag),
            Self::Terminate(m) => m.write(bag),
            Self::Heartbeat(m) => m.write(bag),
            Self::Ping(m) => m.write(bag),
            Self::Cancel(m) => m.write(bag),
            Self::DomainRegister(m) => m.write(bag),
            Self::DomainDescribe(m) => m.write(bag),
            Self::DomainUpdate(m) => m.write(bag),
            Self::DomainDeprecate(m) => m.write(bag),
            Self::NewWorker(m) => m.write(bag),
            Self::StopWorker(m) => m.write(bag),
            Self::WorkflowExecute(m) => m.write(bag),
            Self::WorkflowSignal(m) => m.write(bag),
            Self::WorkflowQuery(m) => m.write(bag),
            Self::WorkflowGetResult(m) => m.write(bag),
            Self::WorkflowContinueAsNew(m) => m.write(bag),
            Self::WorkflowInvoke(m) => m.write(bag),
            Self::ActivityInvoke(m) => m.write(bag),
            Self::ActivityRecordHeartbeat(m) => m.write(bag),
            Self::ActivityGetHeartbeatDetails(m) => m.write(bag),
            Self::ActivityComplete(m) => m.write(bag),
        }
    }

    pub(crate) fn read(message_type: MessageType, bag: &PropertyBag) -> Option<Self> {
        Some(match message_type {
            MessageType::InitializeRequest => Self::Initialize(InitializeRequest::read(bag)),
            MessageType::ConnectRequest => Self::Connect(ConnectRequest::read(bag)),
            MessageType::TerminateRequest => Self::Terminate(TerminateRequest::read(bag)),
            MessageType::HeartbeatRequest => Self::Heartbeat(HeartbeatRequest::read(bag)),
            MessageType::PingRequest => Self::Ping(PingRequest::read(bag)),
            MessageType::CancelRequest => Self::Cancel(CancelRequest::read(bag)),
            MessageType::DomainRegisterRequest => {
                Self::DomainRegister(DomainRegisterRequest::read(bag))
            }
            MessageType::DomainDescribeRequest => {
                Self::DomainDescribe(DomainDescribeRequest::read(bag))
            }
            MessageType::DomainUpdateRequest => Self::DomainUpdate(DomainUpdateRequest::read(bag)),
            MessageType::DomainDeprecateRequest => {
                Self::DomainDeprecate(DomainDeprecateRequest::read(bag))
            }
            MessageType::NewWorkerRequest => Self::NewWorker(NewWorkerRequest::read(bag)),
            MessageType::StopWorkerRequest => Self::StopWorker(StopWorkerRequest::read(bag)),
            MessageType::WorkflowExecuteRequest => {
                Self::WorkflowExecute(WorkflowExecuteRequest::read(bag))
            }
            MessageType::WorkflowSignalRequest => {
                Self::WorkflowSignal(WorkflowSignalRequest::read(bag))
            }
            MessageType::WorkflowQueryRequest => {
                Self::WorkflowQuery(WorkflowQueryRequest::read(bag))
            }
            MessageType::WorkflowGetResultRequest => {
                Self::WorkflowGetResult(WorkflowGetResultRequest::read(bag))
            }
            MessageType::WorkflowContinueAsNewRequest => {
                Self::WorkflowContinueAsNew(WorkflowContinueAsNewRequest::read(bag))
            }
            MessageType::WorkflowInvokeRequest => {
                Self::WorkflowInvoke(WorkflowInvokeRequest::read(bag))
            }
            MessageType::ActivityInvokeRequest => {
                Self::ActivityInvoke(ActivityInvokeRequest::read(bag))
            }
            MessageType::ActivityRecordHeartbeatRequest => {
                Self::ActivityRecordHeartbeat(ActivityRecordHeartbeatRequest::read(bag))
            }
            MessageType::ActivityGetHeartbeatDetailsRequest => {
                Self::ActivityGetHeartbeatDetails(ActivityGetHeartbeatDetailsRequest::read(bag))
            }
            MessageType::ActivityCompleteRequest => {
                Self::ActivityComplete(ActivityCompleteRequest::read(bag))
            }
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// ProxyReply
// ---------------------------------------------------------------------------

/// One reply message: a variant body plus the shared remote-error slot.
///
/// The error slot travels as a JSON property under the `Error` key. A reply
/// carrying an error still has its body variant, so the correlation engine
/// validates the variant pairing before surfacing the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub error: Option<RemoteError>,
    pub body: ReplyBody,
}

impl ProxyReply {
    /// A successful reply around the given body.
    #[must_use]
    pub fn ok(body: ReplyBody) -> Self {
        Self { error: None, body }
    }

    /// A failed reply carrying an engine-supplied error.
    #[must_use]
    pub fn failed(body: ReplyBody, error: RemoteError) -> Self {
        Self {
            error: Some(error),
            body,
        }
    }

    /// Wire discriminator of this reply.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub(crate) fn write_fields(&self, bag: &mut PropertyBag) {
        if self.error.is_some() {
            bag.set_json("Error", self.error.as_ref());
        }
        self.body.write_fields(bag);
    }

    pub(crate) fn read(message_type: MessageType, bag: &PropertyBag) -> Option<Self> {
        Some(Self {
            error: bag.get_json("Error"),
            body: ReplyBody::read(message_type, bag)?,
        })
    }
}

/// The closed set of reply variant bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Initialize(InitializeReply),
    Connect(ConnectReply),
    Terminate(TerminateReply),
    Heartbeat(HeartbeatReply),
    Ping(PingReply),
    Cancel(CancelReply),
    DomainRegister(DomainRegisterReply),
    DomainDescribe(DomainDescribeReply),
    DomainUpdate(DomainUpdateReply),
    DomainDeprecate(DomainDeprecateReply),
    NewWorker(NewWorkerReply),
    StopWorker(StopWorkerReply),
    WorkflowExecute(WorkflowExecuteReply),
    WorkflowSignal(WorkflowSignalReply),
    WorkflowQuery(WorkflowQueryReply),
    WorkflowGetResult(WorkflowGetResultReply),
    WorkflowContinueAsNew(WorkflowContinueAsNewReply),
    WorkflowInvoke(WorkflowInvokeReply),
    ActivityInvoke(ActivityInvokeReply),
    ActivityRecordHeartbeat(ActivityRecordHeartbeatReply),
    ActivityGetHeartbeatDetails(ActivityGetHeartbeatDetailsReply),
    ActivityComplete(ActivityCompleteReply),
}

impl ReplyBody {
    /// Wire discriminator of this reply body.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Initialize(_) => MessageType::InitializeReply,
            Self::Connect(_) => MessageType::ConnectReply,
            Self::Terminate(_) => MessageType::TerminateReply,
            Self::Heartbeat(_) => MessageType::HeartbeatReply,
            Self::Ping(_) => MessageType::PingReply,
            Self::Cancel(_) => MessageType::CancelReply,
            Self::DomainRegister(_) => MessageType::DomainRegisterReply,
            Self::DomainDescribe(_) => MessageType::DomainDescribeReply,
            Self::DomainUpdate(_) => MessageType::DomainUpdateReply,
            Self::DomainDeprecate(_) => MessageType::DomainDeprecateReply,
            Self::NewWorker(_) => MessageType::NewWorkerReply,
            Self::StopWorker(_) => MessageType::StopWorkerReply,
            Self::WorkflowExecute(_) => MessageType::WorkflowExecuteReply,
            Self::WorkflowSignal(_) => MessageType::WorkflowSignalReply,
            Self::WorkflowQuery(_) => MessageType::WorkflowQueryReply,
            Self::WorkflowGetResult(_) => MessageType::WorkflowGetResultReply,
            Self::WorkflowContinueAsNew(_) => MessageType::WorkflowContinueAsNewReply,
            Self::WorkflowInvoke(_) => MessageType::WorkflowInvokeReply,
            Self::ActivityInvoke(_) => MessageType::ActivityInvokeReply,
            Self::ActivityRecordHeartbeat(_) => MessageType::ActivityRecordHeartbeatReply,
            Self::ActivityGetHeartbeatDetails(_) => {
                MessageType::ActivityGetHeartbeatDetailsReply
            }
            Self::ActivityComplete(_) => MessageType::ActivityCompleteReply,
        }
    }

    pub(crate) fn write_fields(&self, bag: &mut PropertyBag) {
        match self {
            Self::Initialize(m) => m.write(bag),
            Self::Connect(m) => m.write(bag),
            Self::Terminate(m) => m.write(bag),
            Self::Heartbeat(m) => m.write(bag),
            Self::Ping(m) => m.write(bag),
            Self::Cancel(m) => m.write(bag),
            Self::DomainRegister(m) => m.write(bag),
            Self::DomainDescribe(m) => m.write(bag),
            Self::DomainUpdate(m) => m.write(bag),
            Self::DomainDeprecate(m) => m.write(bag),
            Self::NewWorker(m) => m.write(bag),
            Self::StopWorker(m) => m.write(bag),
            Self::WorkflowExecute(m) => m.write(bag),
            Self::WorkflowSignal(m) => m.write(bag),
            Self::WorkflowQuery(m) => m.write(bag),
            Self::WorkflowGetResult(m) => m.write(bag),
            Self::WorkflowContinueAsNew(m) => m.write(bag),
            Self::WorkflowInvoke(m) => m.write(bag),
            Self::ActivityInvoke(m) => m.write(bag),
            Self::ActivityRecordHeartbeat(m) => m.write(bag),
            Self::ActivityGetHeartbeatDetails(m) => m.write(bag),
            Self::ActivityComplete(m) => m.write(bag),
        }
    }

    pub(crate) fn read(message_type: MessageType, bag: &PropertyBag) -> Option<Self> {
        Some(match message_type {
            MessageType::InitializeReply => Self::Initialize(InitializeReply::read(bag)),
            MessageType::ConnectReply => Self::Connect(ConnectReply::read(bag)),
            MessageType::TerminateReply => Self::Terminate(TerminateReply::read(bag)),
            MessageType::HeartbeatReply => Self::Heartbeat(HeartbeatReply::read(bag)),
            MessageType::PingReply => Self::Ping(PingReply::read(bag)),
            MessageType::CancelReply => Self::Cancel(CancelReply::read(bag)),
            MessageType::DomainRegisterReply => {
                Self::DomainRegister(DomainRegisterReply::read(bag))
            }
            MessageType::DomainDescribeReply => {
                Self::DomainDescribe(DomainDescribeReply::read(bag))
            }
            MessageType::DomainUpdateReply => Self::DomainUpdate(DomainUpdateReply::read(bag)),
            MessageType::DomainDeprecateReply => {
                Self::DomainDeprecate(DomainDeprecateReply::read(bag))
            }
            MessageType::NewWorkerReply => Self::NewWorker(NewWorkerReply::read(bag)),
            MessageType::StopWorkerReply => Self::StopWorker(StopWorkerReply::read(bag)),
            MessageType::WorkflowExecuteReply => {
                Self::WorkflowExecute(WorkflowExecuteReply::read(bag))
            }
            MessageType::WorkflowSignalReply => {
                Self::WorkflowSignal(WorkflowSignalReply::read(bag))
            }
            MessageType::WorkflowQueryReply => Self::WorkflowQuery(WorkflowQueryReply::read(bag)),
            MessageType::WorkflowGetResultReply => {
                Self::WorkflowGetResult(WorkflowGetResultReply::read(bag))
            }
            MessageType::WorkflowContinueAsNewReply => {
                Self::WorkflowContinueAsNew(WorkflowContinueAsNewReply::read(bag))
            }
            MessageType::WorkflowInvokeReply => {
                Self::WorkflowInvoke(WorkflowInvokeReply::read(bag))
            }
            MessageType::ActivityInvokeReply => {
                Self::ActivityInvoke(ActivityInvokeReply::read(bag))
            }
            MessageType::ActivityRecordHeartbeatReply => {
                Self::ActivityRecordHeartbeat(ActivityRecordHeartbeatReply::read(bag))
            }
            MessageType::ActivityGetHeartbeatDetailsReply => {
                Self::ActivityGetHeartbeatDetails(ActivityGetHeartbeatDetailsReply::read(bag))
            }
            MessageType::ActivityCompleteReply => {
                Self::ActivityComplete(ActivityCompleteReply::read(bag))
            }
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// ProxyMessage
// ---------------------------------------------------------------------------

/// Any message that can travel on the wire: one of the two disjoint variant
/// families.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyMessage {
    Request(ProxyRequest),
    Reply(ProxyReply),
}

impl ProxyMessage {
    /// Wire discriminator of the contained message.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Request(r) => r.message_type(),
            Self::Reply(r) => r.message_type(),
        }
    }

    pub(crate) fn write_fields(&self, bag: &mut PropertyBag) {
        match self {
            Self::Request(r) => r.write_fields(bag),
            Self::Reply(r) => r.write_fields(bag),
        }
    }

    /// Rebuilds a message of the given type from decoded fields. Returns
    /// `None` only for [`MessageType::Unspecified`], which never reaches
    /// here through a populated registry.
    pub(crate) fn read(message_type: MessageType, bag: &PropertyBag) -> Option<Self> {
        if message_type.is_reply() {
            ProxyReply::read(message_type, bag).map(Self::Reply)
        } else {
            ProxyRequest::read(message_type, bag).map(Self::Request)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
