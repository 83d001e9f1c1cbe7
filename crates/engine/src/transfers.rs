//! Ownership-transfer workflow.

use chrono::{DateTime, Utc};

use plotbook_auth::{authorize, ActorContext, Capability};
use plotbook_booking::BookingStatus;
use plotbook_core::{
    BookingId, CustomerId, DomainError, DomainResult, ExpectedVersion, TransferId, UnitId,
    Versioned,
};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::UnitStatus;
use plotbook_transfer::{default_fee, Transfer, TransferDraft};

use crate::Engine;

/// Request payload for [`Engine::create_transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub unit_id: UnitId,
    pub booking_id: BookingId,
    pub from_customer: CustomerId,
    pub to_customer: CustomerId,
    /// Explicit fee; defaults to the configured percentage of the booking
    /// amount when absent.
    pub fee: Option<u64>,
    pub remarks: Option<String>,
}

impl<R: Repository> Engine<R> {
    /// Open a pending transfer of a booking to a new customer.
    pub fn create_transfer(
        &self,
        request: TransferRequest,
        actor: &ActorContext,
    ) -> DomainResult<Transfer> {
        authorize(actor, Capability::CreateTransfer)?;

        let unit = self.load_unit(request.unit_id)?;
        let tenant_id = self.ensure_unit_tenant(actor, &unit)?;

        let booking = self.load_booking(request.booking_id)?;
        if booking.unit_id() != request.unit_id {
            return Err(DomainError::invalid_reference(format!(
                "booking {} does not reference unit {}",
                request.booking_id, request.unit_id
            )));
        }

        self.check_customer(request.from_customer, tenant_id)?;
        self.check_customer(request.to_customer, tenant_id)?;
        if request.from_customer == request.to_customer {
            return Err(DomainError::validation(
                "transfer requires two distinct customers",
            ));
        }

        if !matches!(unit.status(), UnitStatus::Booked | UnitStatus::Sold) {
            return Err(DomainError::invalid_transition(format!(
                "cannot transfer a unit in status {}",
                unit.status()
            )));
        }
        if booking.status() != BookingStatus::Confirmed {
            return Err(DomainError::invalid_transition(format!(
                "cannot transfer a booking in status {:?}",
                booking.status()
            )));
        }
        if booking.customer_id() != request.from_customer {
            return Err(DomainError::invalid_reference(
                "from_customer does not match the booking's current customer",
            ));
        }

        let fee = request
            .fee
            .unwrap_or_else(|| default_fee(booking.amount(), self.config().transfer_fee_bp));

        let transfer_id = TransferId::new();
        let transfer = Transfer::create(
            TransferDraft {
                transfer_id,
                unit_id: request.unit_id,
                booking_id: request.booking_id,
                from_customer: request.from_customer,
                to_customer: request.to_customer,
                fee,
                remarks: request.remarks,
            },
            actor.user_id,
        );

        self.commit(UnitOfWork::new().insert_transfer(transfer))?;

        tracing::info!(transfer_id = %transfer_id, unit_id = %request.unit_id, fee, "transfer opened");
        self.load_transfer(transfer_id)
    }

    /// Approve a pending transfer.
    ///
    /// The commercial relationship moves at approval time: the booking's
    /// customer is reassigned in the same atomic commit, before physical or
    /// financial completion.
    pub fn approve_transfer(
        &self,
        transfer_id: TransferId,
        actor: &ActorContext,
    ) -> DomainResult<Transfer> {
        authorize(actor, Capability::ApproveTransfer)?;

        let mut transfer = self.load_transfer(transfer_id)?;
        self.ensure_transfer_tenant(actor, &transfer)?;

        let mut booking = self.load_booking(transfer.booking_id())?;

        let transfer_expected = ExpectedVersion::Exact(transfer.version());
        let booking_expected = ExpectedVersion::Exact(booking.version());
        transfer.approve(actor.user_id)?;
        booking.reassign_customer(transfer.to_customer())?;

        self.commit(
            UnitOfWork::new()
                .write_transfer(transfer, transfer_expected)
                .write_booking(booking, booking_expected),
        )?;

        tracing::info!(transfer_id = %transfer_id, "transfer approved");
        self.load_transfer(transfer_id)
    }

    /// Complete an approved transfer, advancing a Booked unit to Sold.
    pub fn complete_transfer(
        &self,
        transfer_id: TransferId,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Transfer> {
        authorize(actor, Capability::CompleteTransfer)?;

        let mut transfer = self.load_transfer(transfer_id)?;
        self.ensure_transfer_tenant(actor, &transfer)?;

        let transfer_expected = ExpectedVersion::Exact(transfer.version());
        transfer.complete(now)?;

        let mut uow = UnitOfWork::new();
        let unit = self.load_unit(transfer.unit_id())?;
        if unit.status() == UnitStatus::Booked {
            let unit_expected = ExpectedVersion::Exact(unit.version());
            let mut unit = unit;
            unit.mark_sold()?;
            uow = uow.write_unit(unit, unit_expected);
        }

        self.commit(uow.write_transfer(transfer, transfer_expected))?;

        tracing::info!(transfer_id = %transfer_id, "transfer completed");
        self.load_transfer(transfer_id)
    }

    /// Reject a pending transfer (terminal).
    pub fn reject_transfer(
        &self,
        transfer_id: TransferId,
        actor: &ActorContext,
    ) -> DomainResult<Transfer> {
        authorize(actor, Capability::RejectTransfer)?;

        let mut transfer = self.load_transfer(transfer_id)?;
        self.ensure_transfer_tenant(actor, &transfer)?;

        let expected = ExpectedVersion::Exact(transfer.version());
        transfer.reject()?;
        self.commit(UnitOfWork::new().write_transfer(transfer, expected))?;

        tracing::info!(transfer_id = %transfer_id, "transfer rejected");
        self.load_transfer(transfer_id)
    }

    /// Amend fee/remarks while the transfer is still pending.
    pub fn update_transfer(
        &self,
        transfer_id: TransferId,
        fee: Option<u64>,
        remarks: Option<String>,
        actor: &ActorContext,
    ) -> DomainResult<Transfer> {
        authorize(actor, Capability::UpdateTransfer)?;

        let mut transfer = self.load_transfer(transfer_id)?;
        self.ensure_transfer_tenant(actor, &transfer)?;

        let expected = ExpectedVersion::Exact(transfer.version());
        transfer.amend(fee, remarks)?;
        self.commit(UnitOfWork::new().write_transfer(transfer, expected))?;

        self.load_transfer(transfer_id)
    }

    /// Withdraw a pending transfer.
    pub fn delete_transfer(&self, transfer_id: TransferId, actor: &ActorContext) -> DomainResult<()> {
        authorize(actor, Capability::DeleteTransfer)?;

        let transfer = self.load_transfer(transfer_id)?;
        self.ensure_transfer_tenant(actor, &transfer)?;

        if !transfer.is_mutable() {
            return Err(DomainError::invalid_transition(format!(
                "cannot delete a transfer in status {}",
                transfer.status()
            )));
        }

        self.commit(
            UnitOfWork::new()
                .delete_transfer(transfer_id, ExpectedVersion::Exact(transfer.version())),
        )?;

        tracing::info!(transfer_id = %transfer_id, "transfer withdrawn");
        Ok(())
    }

    fn ensure_transfer_tenant(
        &self,
        actor: &ActorContext,
        transfer: &Transfer,
    ) -> DomainResult<()> {
        let unit = self.load_unit(transfer.unit_id())?;
        self.ensure_unit_tenant(actor, &unit)?;
        Ok(())
    }
}
