use serde::{Deserialize, Serialize};

use plotbook_core::{CustomerId, InvestorId, TenantId};

/// Party status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    Active,
    Suspended,
}

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub contact: ContactInfo,
    pub status: PartyStatus,
}

impl Customer {
    pub fn new(id: CustomerId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            contact: ContactInfo::default(),
            status: PartyStatus::Active,
        }
    }
}

/// Investor reference record.
///
/// Consent bookkeeping (assignments, consent records) is owned by the consent
/// module; this record only anchors identity and tenant ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub id: InvestorId,
    pub tenant_id: TenantId,
    pub name: String,
    pub contact: ContactInfo,
    pub status: PartyStatus,
}

impl Investor {
    pub fn new(id: InvestorId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            contact: ContactInfo::default(),
            status: PartyStatus::Active,
        }
    }
}
