//! Capability policy table.
//!
//! Pure functions: no IO, no panics, no business logic beyond the table.

use plotbook_core::{DomainError, DomainResult, TenantId};

use crate::actor::{ActorContext, Role};
use crate::capability::Capability;

/// The per-operation capability table.
///
/// Every row lists the roles it grants, including `MasterAdmin` where the
/// platform operator is allowed: there is no implicit wildcard.
pub fn grants(role: Role, capability: Capability) -> bool {
    use Capability::*;
    use Role::*;

    match capability {
        CreateUnit | UpdateUnit | DeactivateUnit => {
            matches!(role, MasterAdmin | SuperAdmin | Admin)
        }
        // Reactivating a retired unit is a platform-level operation.
        ReactivateUnit => matches!(role, MasterAdmin),
        PlaceHold | ReleaseHold | CreateBooking => {
            matches!(role, MasterAdmin | SuperAdmin | Admin | SalesAgent)
        }
        SweepHolds => matches!(role, MasterAdmin | SuperAdmin | Admin),
        CancelBooking | DeleteBooking => matches!(role, MasterAdmin | SuperAdmin | Admin),
        CreateTransfer | ApproveTransfer | CompleteTransfer | RejectTransfer | UpdateTransfer
        | DeleteTransfer => matches!(role, MasterAdmin | SuperAdmin | Admin),
        CreateProject | AssignInvestor => matches!(role, MasterAdmin | SuperAdmin | Admin),
        GrantConsent | RevokeConsent => matches!(role, MasterAdmin | Investor),
    }
}

/// Authorize an actor for one capability.
pub fn authorize(actor: &ActorContext, capability: Capability) -> DomainResult<()> {
    if grants(actor.role, capability) {
        Ok(())
    } else {
        Err(DomainError::forbidden(capability.as_str()))
    }
}

/// Check the actor may touch a resource owned by `tenant_id`.
///
/// Platform-scoped actors pass; everyone else must carry the same tenant.
pub fn ensure_tenant(actor: &ActorContext, tenant_id: TenantId) -> DomainResult<()> {
    if actor.is_platform_scoped() {
        return Ok(());
    }
    if actor.tenant_id == Some(tenant_id) {
        Ok(())
    } else {
        Err(DomainError::TenantMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotbook_core::UserId;

    fn actor(role: Role, tenant: Option<TenantId>) -> ActorContext {
        ActorContext::new(UserId::new(), role, tenant)
    }

    #[test]
    fn sales_agent_can_hold_but_not_cancel() {
        let agent = actor(Role::SalesAgent, Some(TenantId::new()));
        assert!(authorize(&agent, Capability::PlaceHold).is_ok());
        assert!(authorize(&agent, Capability::CreateBooking).is_ok());

        let err = authorize(&agent, Capability::CancelBooking).unwrap_err();
        assert_eq!(err, DomainError::forbidden("booking.cancel"));
    }

    #[test]
    fn reactivation_is_platform_only() {
        assert!(grants(Role::MasterAdmin, Capability::ReactivateUnit));
        assert!(!grants(Role::SuperAdmin, Capability::ReactivateUnit));
        assert!(!grants(Role::Admin, Capability::ReactivateUnit));
    }

    #[test]
    fn investors_only_touch_consent() {
        let inv = actor(Role::Investor, Some(TenantId::new()));
        assert!(authorize(&inv, Capability::GrantConsent).is_ok());
        assert!(authorize(&inv, Capability::RevokeConsent).is_ok());
        assert!(authorize(&inv, Capability::PlaceHold).is_err());
        assert!(authorize(&inv, Capability::CreateTransfer).is_err());
    }

    #[test]
    fn tenant_check_allows_platform_scope() {
        let tenant = TenantId::new();
        let platform = actor(Role::MasterAdmin, None);
        assert!(ensure_tenant(&platform, tenant).is_ok());

        let local = actor(Role::Admin, Some(tenant));
        assert!(ensure_tenant(&local, tenant).is_ok());

        let other = actor(Role::Admin, Some(TenantId::new()));
        assert_eq!(ensure_tenant(&other, tenant).unwrap_err(), DomainError::TenantMismatch);
    }
}
