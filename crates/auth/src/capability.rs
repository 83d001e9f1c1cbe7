use serde::{Deserialize, Serialize};

/// One capability per engine operation.
///
/// Authorization is decided by the typed table in [`crate::policy`], never by
/// comparing role strings at call sites.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateUnit,
    UpdateUnit,
    DeactivateUnit,
    ReactivateUnit,
    PlaceHold,
    ReleaseHold,
    SweepHolds,
    CreateBooking,
    CancelBooking,
    DeleteBooking,
    CreateTransfer,
    ApproveTransfer,
    CompleteTransfer,
    RejectTransfer,
    UpdateTransfer,
    DeleteTransfer,
    CreateProject,
    AssignInvestor,
    GrantConsent,
    RevokeConsent,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CreateUnit => "unit.create",
            Capability::UpdateUnit => "unit.update",
            Capability::DeactivateUnit => "unit.deactivate",
            Capability::ReactivateUnit => "unit.reactivate",
            Capability::PlaceHold => "hold.place",
            Capability::ReleaseHold => "hold.release",
            Capability::SweepHolds => "hold.sweep",
            Capability::CreateBooking => "booking.create",
            Capability::CancelBooking => "booking.cancel",
            Capability::DeleteBooking => "booking.delete",
            Capability::CreateTransfer => "transfer.create",
            Capability::ApproveTransfer => "transfer.approve",
            Capability::CompleteTransfer => "transfer.complete",
            Capability::RejectTransfer => "transfer.reject",
            Capability::UpdateTransfer => "transfer.update",
            Capability::DeleteTransfer => "transfer.delete",
            Capability::CreateProject => "project.create",
            Capability::AssignInvestor => "consent.assign",
            Capability::GrantConsent => "consent.grant",
            Capability::RevokeConsent => "consent.revoke",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
