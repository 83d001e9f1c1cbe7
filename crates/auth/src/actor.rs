use serde::{Deserialize, Serialize};

use plotbook_core::{InvestorId, TenantId, UserId};

/// Actor role, resolved by the caller before any engine operation runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; not bound to any single tenant.
    MasterAdmin,
    SuperAdmin,
    Admin,
    SalesAgent,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MasterAdmin => "master_admin",
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::SalesAgent => "sales_agent",
            Role::Investor => "investor",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved actor for an engine call.
///
/// This is immutable and must be present for every operation. `tenant_id` is
/// `None` only for platform-scoped actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub investor_id: Option<InvestorId>,
}

impl ActorContext {
    pub fn new(user_id: UserId, role: Role, tenant_id: Option<TenantId>) -> Self {
        Self {
            user_id,
            role,
            tenant_id,
            investor_id: None,
        }
    }

    pub fn with_investor(mut self, investor_id: InvestorId) -> Self {
        self.investor_id = Some(investor_id);
        self
    }

    /// Platform-wide scope: not confined to one tenant.
    pub fn is_platform_scoped(&self) -> bool {
        matches!(self.role, Role::MasterAdmin)
    }

    /// Elevated administrative scope within (or above) a tenant.
    ///
    /// Used for the hold-conversion override: an elevated actor may convert a
    /// hold placed by somebody else.
    pub fn is_elevated(&self) -> bool {
        matches!(self.role, Role::MasterAdmin | Role::SuperAdmin | Role::Admin)
    }
}
