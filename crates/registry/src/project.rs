use serde::{Deserialize, Serialize};

use plotbook_core::{PhaseId, ProjectId, TenantId, UserId, Versioned};

/// Project status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
    Cancelled,
}

/// A development project owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub status: ProjectStatus,
    pub created_by: UserId,
    pub version: u64,
}

impl Project {
    pub fn new(
        id: ProjectId,
        tenant_id: TenantId,
        name: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            status: ProjectStatus::Active,
            created_by,
            version: 0,
        }
    }

    /// Counts against the tenant's project quota.
    ///
    /// Completed projects still hold a slot; only cancellation frees one.
    pub fn counts_against_quota(&self) -> bool {
        self.status != ProjectStatus::Cancelled
    }
}

impl Versioned for Project {
    type Id = ProjectId;

    fn id(&self) -> ProjectId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// A phase or block within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub project_id: ProjectId,
    pub name: String,
}

/// Tenant (builder organization) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Suspended,
    Inactive,
}

/// The owning builder organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub max_projects: u32,
    pub status: TenantStatus,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>, max_projects: u32) -> Self {
        Self {
            id,
            name: name.into(),
            max_projects,
            status: TenantStatus::Active,
        }
    }
}
