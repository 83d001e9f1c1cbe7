use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plotbook_core::{AssignmentId, ConsentId, InvestorId, UnitId, UserId, Versioned};

/// Assignment status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

/// An investor's stake in a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorAssignment {
    pub id: AssignmentId,
    pub investor_id: InvestorId,
    pub unit_id: UnitId,
    /// Percentage share in basis points (5000 = 50%).
    pub share_bp: u16,
    pub consent_required: bool,
    pub status: AssignmentStatus,
    pub created_by: UserId,
    pub version: u64,
}

impl InvestorAssignment {
    pub fn new(
        id: AssignmentId,
        investor_id: InvestorId,
        unit_id: UnitId,
        share_bp: u16,
        consent_required: bool,
        created_by: UserId,
    ) -> Self {
        Self {
            id,
            investor_id,
            unit_id,
            share_bp,
            consent_required,
            status: AssignmentStatus::Active,
            created_by,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

impl Versioned for InvestorAssignment {
    type Id = AssignmentId;

    fn id(&self) -> AssignmentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// A recorded grant of consent against one assignment.
///
/// Revocation is tombstoned rather than deleted so the decision trail stays
/// reconstructable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: ConsentId,
    pub assignment_id: AssignmentId,
    pub granted_by: UserId,
    pub granted_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl ConsentRecord {
    pub fn grant(
        id: ConsentId,
        assignment_id: AssignmentId,
        granted_by: UserId,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            assignment_id,
            granted_by,
            granted_at,
            revoked_at: None,
            version: 0,
        }
    }

    pub fn is_in_force(&self) -> bool {
        self.revoked_at.is_none()
    }
}

impl Versioned for ConsentRecord {
    type Id = ConsentId;

    fn id(&self) -> ConsentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
