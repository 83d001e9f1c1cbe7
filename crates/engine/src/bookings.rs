//! Booking creation, cancellation and deletion.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use plotbook_auth::{authorize, ActorContext, Capability};
use plotbook_booking::{booking_reference, Booking, BookingDraft, BookingType};
use plotbook_core::{
    BookingId, CustomerId, DomainError, DomainResult, ExpectedVersion, TenantId, UnitId, Versioned,
};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::{Unit, UnitStatus};

use crate::Engine;

/// Request payload for [`Engine::create_booking`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub unit_id: UnitId,
    pub customer_id: CustomerId,
    /// Amount in smallest currency unit.
    pub amount: u64,
    pub booking_type: BookingType,
    pub remarks: Option<String>,
}

impl<R: Repository> Engine<R> {
    /// Convert an available or held unit into a confirmed booking.
    ///
    /// On a held unit, only the original holder or an elevated actor may
    /// convert. A hold that has already lapsed fails with `HoldExpired`, and
    /// the Available revert is committed as part of this same call; the unit
    /// is never left in a stale OnHold state.
    pub fn create_booking(
        &self,
        request: BookingRequest,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        authorize(actor, Capability::CreateBooking)?;

        if request.amount == 0 {
            return Err(DomainError::validation("booking amount must be positive"));
        }

        let mut unit = self.load_unit(request.unit_id)?;
        let tenant_id = self.ensure_unit_tenant(actor, &unit)?;
        self.check_customer(request.customer_id, tenant_id)?;

        match unit.status() {
            UnitStatus::Available => {}
            UnitStatus::OnHold => {
                if unit.held_by() != Some(actor.user_id) && !actor.is_elevated() {
                    return Err(DomainError::forbidden(
                        "only the holder or an elevated actor can convert a hold to a booking",
                    ));
                }
                if unit.hold_expired(now) {
                    return self.fail_expired_conversion(unit);
                }
            }
            other => {
                return Err(DomainError::invalid_transition(format!(
                    "unit is not available for booking (current status: {other})"
                )));
            }
        }

        self.check_consent(&unit)?;

        // Invariant guard: a unit carries at most one non-cancelled booking.
        if self
            .repo()
            .active_booking_for_unit(unit.unit_id())
            .map_err(DomainError::from)?
            .is_some()
        {
            return Err(DomainError::conflict("unit already has an active booking"));
        }

        let booking_id = BookingId::new();
        let reference = booking_reference(now, Uuid::now_v7());
        let booking = Booking::create(
            BookingDraft {
                booking_id,
                unit_id: unit.unit_id(),
                customer_id: request.customer_id,
                project_id: unit.project_id(),
                amount: request.amount,
                booking_type: request.booking_type,
                remarks: request.remarks,
            },
            reference,
            actor.user_id,
            now,
        );

        let expected = ExpectedVersion::Exact(unit.version());
        unit.book(actor.user_id)?;

        self.commit(
            UnitOfWork::new()
                .write_unit(unit, expected)
                .insert_booking(booking),
        )?;

        tracing::info!(
            booking_id = %booking_id,
            unit_id = %request.unit_id,
            customer_id = %request.customer_id,
            "booking created"
        );
        self.load_booking(booking_id)
    }

    /// Cancel a booking, reverting the unit to Available in the same commit.
    pub fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: &str,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Unit> {
        authorize(actor, Capability::CancelBooking)?;

        let mut booking = self.load_booking(booking_id)?;
        self.ensure_booking_tenant(actor, &booking)?;

        // Status rules first: double-cancel reports AlreadyInState without
        // touching the unit.
        let booking_expected = ExpectedVersion::Exact(booking.version());
        booking.cancel(reason, actor.user_id, now)?;

        let unit_id = booking.unit_id();
        let mut unit = self.load_unit(unit_id)?;
        let unit_expected = ExpectedVersion::Exact(unit.version());
        unit.make_available()?;

        self.commit(
            UnitOfWork::new()
                .write_booking(booking, booking_expected)
                .write_unit(unit, unit_expected),
        )?;

        tracing::info!(booking_id = %booking_id, reason, "booking cancelled");
        self.load_unit(unit_id)
    }

    /// Hard-remove a booking.
    ///
    /// Permitted only while the booking is still Confirmed and the unit has
    /// not progressed to Sold; the unit reverts to Available as a side
    /// effect, symmetric with cancellation.
    pub fn delete_booking(&self, booking_id: BookingId, actor: &ActorContext) -> DomainResult<Unit> {
        authorize(actor, Capability::DeleteBooking)?;

        let booking = self.load_booking(booking_id)?;
        self.ensure_booking_tenant(actor, &booking)?;

        if !booking.is_deletable() {
            return Err(DomainError::invalid_transition(format!(
                "only confirmed bookings can be deleted (current status: {:?})",
                booking.status()
            )));
        }

        let mut unit = self.load_unit(booking.unit_id())?;
        if unit.status() == UnitStatus::Sold {
            return Err(DomainError::invalid_transition(
                "cannot delete the booking of a sold unit",
            ));
        }

        let unit_id = unit.unit_id();
        let unit_expected = ExpectedVersion::Exact(unit.version());
        unit.make_available()?;

        self.commit(
            UnitOfWork::new()
                .delete_booking(booking_id, ExpectedVersion::Exact(booking.version()))
                .write_unit(unit, unit_expected),
        )?;

        tracing::info!(booking_id = %booking_id, unit_id = %unit_id, "booking deleted");
        self.load_unit(unit_id)
    }

    /// Abort an expired-hold conversion: revert the unit and report
    /// `HoldExpired` from the same atomic operation.
    fn fail_expired_conversion(&self, mut unit: Unit) -> DomainResult<Booking> {
        let unit_id = unit.unit_id();
        let expected = ExpectedVersion::Exact(unit.version());
        unit.make_available()?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        tracing::info!(unit_id = %unit_id, "expired hold reverted during conversion");
        Err(DomainError::HoldExpired)
    }

    pub(crate) fn check_customer(
        &self,
        customer_id: CustomerId,
        tenant_id: TenantId,
    ) -> DomainResult<()> {
        let customer = self
            .repo()
            .customer(customer_id)
            .map_err(DomainError::from)?
            .ok_or_else(|| {
                DomainError::invalid_reference(format!("customer {customer_id} not found"))
            })?;
        if customer.tenant_id != tenant_id {
            return Err(DomainError::invalid_reference(format!(
                "customer {customer_id} does not belong to tenant {tenant_id}"
            )));
        }
        Ok(())
    }

    pub(crate) fn ensure_booking_tenant(
        &self,
        actor: &ActorContext,
        booking: &Booking,
    ) -> DomainResult<TenantId> {
        let project = self
            .repo()
            .project(booking.project_id())
            .map_err(DomainError::from)?
            .ok_or_else(|| {
                DomainError::invalid_reference(format!(
                    "project {} for booking {} does not exist",
                    booking.project_id(),
                    booking.booking_id()
                ))
            })?;
        plotbook_auth::ensure_tenant(actor, project.tenant_id)?;
        Ok(project.tenant_id)
    }
}
