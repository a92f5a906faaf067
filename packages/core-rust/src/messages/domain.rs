//! Domain management request/reply pairs.

use super::PayloadSchema;
use crate::properties::PropertyBag;
use crate::types::DomainInfo;

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// Registers a new domain with the orchestration engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainRegisterRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_email: Option<String>,
    /// Workflow history retention in days.
    pub retention_days: i32,
    pub emit_metrics: bool,
    /// Engine security token, when the cluster requires one for admin
    /// operations.
    pub security_token: Option<String>,
}

impl PayloadSchema for DomainRegisterRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Name", self.name.clone());
        bag.set_opt_string("Description", self.description.clone());
        bag.set_opt_string("OwnerEmail", self.owner_email.clone());
        bag.set_i32("RetentionDays", self.retention_days);
        bag.set_bool("EmitMetrics", self.emit_metrics);
        bag.set_opt_string("SecurityToken", self.security_token.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            name: bag.get_opt_string("Name"),
            description: bag.get_opt_string("Description"),
            owner_email: bag.get_opt_string("OwnerEmail"),
            retention_days: bag.get_i32("RetentionDays"),
            emit_metrics: bag.get_bool("EmitMetrics"),
            security_token: bag.get_opt_string("SecurityToken"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainRegisterReply;

impl PayloadSchema for DomainRegisterReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Describe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDescribeRequest {
    pub name: Option<String>,
}

impl PayloadSchema for DomainDescribeRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Name", self.name.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            name: bag.get_opt_string("Name"),
        }
    }
}

/// Domain metadata, carried as a structured sub-object under one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDescribeReply {
    pub info: Option<DomainInfo>,
}

impl PayloadSchema for DomainDescribeReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_json("Info", self.info.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            info: bag.get_json("Info"),
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainUpdateRequest {
    pub name: Option<String>,
    /// Replacement metadata; fields left at defaults keep their engine-side
    /// values.
    pub updated_info: Option<DomainInfo>,
    pub security_token: Option<String>,
}

impl PayloadSchema for DomainUpdateRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Name", self.name.clone());
        bag.set_json("UpdatedInfo", self.updated_info.as_ref());
        bag.set_opt_string("SecurityToken", self.security_token.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            name: bag.get_opt_string("Name"),
            updated_info: bag.get_json("UpdatedInfo"),
            security_token: bag.get_opt_string("SecurityToken"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainUpdateReply;

impl PayloadSchema for DomainUpdateReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Deprecate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDeprecateRequest {
    pub name: Option<String>,
    pub security_token: Option<String>,
}

impl PayloadSchema for DomainDeprecateRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Name", self.name.clone());
        bag.set_opt_string("SecurityToken", self.security_token.clone());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            name: bag.get_opt_string("Name"),
            security_token: bag.get_opt_string("SecurityToken"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainDeprecateReply;

impl PayloadSchema for DomainDeprecateReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
