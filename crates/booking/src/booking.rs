use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plotbook_core::{
    BookingId, CustomerId, DomainError, DomainResult, ProjectId, UnitId, UserId, Versioned,
};

/// Booking status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

/// Commercial flavour of a booking.
///
/// Orthogonal to [`BookingStatus`]: a `Hold`-type booking can be Confirmed,
/// and a `Sale`-type booking can be Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Hold,
    Booking,
    Sale,
}

/// Cancellation details, present iff the booking is Cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: UserId,
}

/// Creation payload for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub booking_id: BookingId,
    pub unit_id: UnitId,
    pub customer_id: CustomerId,
    pub project_id: ProjectId,
    /// Amount in smallest currency unit.
    pub amount: u64,
    pub booking_type: BookingType,
    pub remarks: Option<String>,
}

/// A confirmed commitment of a unit to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    unit_id: UnitId,
    customer_id: CustomerId,
    project_id: ProjectId,
    amount: u64,
    status: BookingStatus,
    booking_type: BookingType,
    reference: String,
    booked_at: DateTime<Utc>,
    cancellation: Option<Cancellation>,
    remarks: Option<String>,
    created_by: UserId,
    version: u64,
}

impl Booking {
    /// Create a confirmed booking from a draft.
    pub fn create(
        draft: BookingDraft,
        reference: String,
        created_by: UserId,
        booked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: draft.booking_id,
            unit_id: draft.unit_id,
            customer_id: draft.customer_id,
            project_id: draft.project_id,
            amount: draft.amount,
            status: BookingStatus::Confirmed,
            booking_type: draft.booking_type,
            reference,
            booked_at,
            cancellation: None,
            remarks: draft.remarks,
            created_by,
            version: 0,
        }
    }

    pub fn booking_id(&self) -> BookingId {
        self.id
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn booking_type(&self) -> BookingType {
        self.booking_type
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn booked_at(&self) -> DateTime<Utc> {
        self.booked_at
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// An active booking is the one allocation a unit may carry.
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    /// Cancel the booking.
    ///
    /// Cancelling twice is a redundant mutation (`AlreadyInState`); a
    /// completed booking is immutable (`InvalidTransition`).
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        cancelled_by: UserId,
        cancelled_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        match self.status {
            BookingStatus::Cancelled => {
                Err(DomainError::already_in_state("booking is already cancelled"))
            }
            BookingStatus::Completed => Err(DomainError::invalid_transition(
                "completed bookings cannot be cancelled",
            )),
            BookingStatus::Confirmed => {
                self.status = BookingStatus::Cancelled;
                self.cancellation = Some(Cancellation {
                    reason: reason.into(),
                    cancelled_at,
                    cancelled_by,
                });
                Ok(())
            }
        }
    }

    /// Reassign the commercial relationship to a new customer.
    ///
    /// Only an active booking can move; this is driven by transfer approval.
    pub fn reassign_customer(&mut self, to_customer: CustomerId) -> DomainResult<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(DomainError::invalid_transition(format!(
                "cannot reassign a booking in status {:?}",
                self.status
            )));
        }
        self.customer_id = to_customer;
        Ok(())
    }

    /// True while hard deletion is still permitted.
    pub fn is_deletable(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    #[doc(hidden)]
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for Booking {
    type Id = BookingId;

    fn id(&self) -> BookingId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
