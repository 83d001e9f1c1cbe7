use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plotbook_core::{
    BookingId, CustomerId, DomainError, DomainResult, TransferId, UnitId, UserId, Versioned,
};

/// Transfer status lifecycle.
///
/// Pending → {Approved, Rejected}; Approved → Completed. Rejected and
/// Completed are terminal; a transfer never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
        }
    }
}

impl core::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default transfer fee: `amount × fee_bp / 10_000`, in smallest currency
/// units.
pub fn default_fee(amount: u64, fee_bp: u32) -> u64 {
    amount.saturating_mul(fee_bp as u64) / 10_000
}

/// Creation payload for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub transfer_id: TransferId,
    pub unit_id: UnitId,
    pub booking_id: BookingId,
    pub from_customer: CustomerId,
    pub to_customer: CustomerId,
    pub fee: u64,
    pub remarks: Option<String>,
}

/// A pending-to-completed reassignment of a booking's customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    id: TransferId,
    unit_id: UnitId,
    booking_id: BookingId,
    from_customer: CustomerId,
    to_customer: CustomerId,
    fee: u64,
    status: TransferStatus,
    approved_by: Option<UserId>,
    transfer_date: Option<DateTime<Utc>>,
    remarks: Option<String>,
    created_by: UserId,
    version: u64,
}

impl Transfer {
    pub fn create(draft: TransferDraft, created_by: UserId) -> Self {
        Self {
            id: draft.transfer_id,
            unit_id: draft.unit_id,
            booking_id: draft.booking_id,
            from_customer: draft.from_customer,
            to_customer: draft.to_customer,
            fee: draft.fee,
            status: TransferStatus::Pending,
            approved_by: None,
            transfer_date: None,
            remarks: draft.remarks,
            created_by,
            version: 0,
        }
    }

    pub fn transfer_id(&self) -> TransferId {
        self.id
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    pub fn from_customer(&self) -> CustomerId {
        self.from_customer
    }

    pub fn to_customer(&self) -> CustomerId {
        self.to_customer
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn transfer_date(&self) -> Option<DateTime<Utc>> {
        self.transfer_date
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Only pending transfers may still be edited or withdrawn.
    pub fn is_mutable(&self) -> bool {
        self.status == TransferStatus::Pending
    }

    fn require_status(&self, expected: TransferStatus, action: &str) -> DomainResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(format!(
                "cannot {action} a transfer in status {} (requires {expected})",
                self.status
            )))
        }
    }

    /// Pending → Approved, recording the approver.
    pub fn approve(&mut self, approved_by: UserId) -> DomainResult<()> {
        self.require_status(TransferStatus::Pending, "approve")?;
        self.status = TransferStatus::Approved;
        self.approved_by = Some(approved_by);
        Ok(())
    }

    /// Pending → Rejected (terminal).
    pub fn reject(&mut self) -> DomainResult<()> {
        self.require_status(TransferStatus::Pending, "reject")?;
        self.status = TransferStatus::Rejected;
        Ok(())
    }

    /// Approved → Completed (terminal), stamping the transfer date.
    pub fn complete(&mut self, completed_at: DateTime<Utc>) -> DomainResult<()> {
        self.require_status(TransferStatus::Approved, "complete")?;
        self.status = TransferStatus::Completed;
        self.transfer_date = Some(completed_at);
        Ok(())
    }

    /// Update fee/remarks while still pending.
    pub fn amend(&mut self, fee: Option<u64>, remarks: Option<String>) -> DomainResult<()> {
        self.require_status(TransferStatus::Pending, "update")?;
        if let Some(fee) = fee {
            self.fee = fee;
        }
        if let Some(remarks) = remarks {
            self.remarks = Some(remarks);
        }
        Ok(())
    }

    #[doc(hidden)]
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for Transfer {
    type Id = TransferId;

    fn id(&self) -> TransferId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_transfer() -> Transfer {
        Transfer::create(
            TransferDraft {
                transfer_id: TransferId::new(),
                unit_id: UnitId::new(),
                booking_id: BookingId::new(),
                from_customer: CustomerId::new(),
                to_customer: CustomerId::new(),
                fee: 19_000,
                remarks: None,
            },
            UserId::new(),
        )
    }

    #[test]
    fn default_fee_is_basis_points_of_amount() {
        assert_eq!(default_fee(950_000, 200), 19_000);
        assert_eq!(default_fee(1_000_000, 200), 20_000);
        assert_eq!(default_fee(0, 200), 0);
    }

    #[test]
    fn approve_records_approver() {
        let mut t = test_transfer();
        let approver = UserId::new();
        t.approve(approver).unwrap();
        assert_eq!(t.status(), TransferStatus::Approved);
        assert_eq!(t.approved_by(), Some(approver));
    }

    #[test]
    fn complete_requires_approval_first() {
        let mut t = test_transfer();
        let err = t.complete(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        t.approve(UserId::new()).unwrap();
        t.complete(Utc::now()).unwrap();
        assert_eq!(t.status(), TransferStatus::Completed);
        assert!(t.transfer_date().is_some());
    }

    #[test]
    fn terminal_states_never_regress() {
        let mut rejected = test_transfer();
        rejected.reject().unwrap();
        assert!(rejected.approve(UserId::new()).is_err());
        assert!(rejected.complete(Utc::now()).is_err());
        assert!(rejected.amend(Some(1), None).is_err());

        let mut completed = test_transfer();
        completed.approve(UserId::new()).unwrap();
        completed.complete(Utc::now()).unwrap();
        assert!(completed.reject().is_err());
        assert!(completed.approve(UserId::new()).is_err());
        assert!(completed.amend(None, Some("late".to_string())).is_err());
    }

    #[test]
    fn amend_only_while_pending() {
        let mut t = test_transfer();
        t.amend(Some(25_000), Some("negotiated".to_string())).unwrap();
        assert_eq!(t.fee(), 25_000);

        t.approve(UserId::new()).unwrap();
        assert!(t.amend(Some(1), None).is_err());
        assert_eq!(t.fee(), 25_000);
    }
}
